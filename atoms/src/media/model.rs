/// Content type used for uploads when the caller does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Object key for a task attachment: `{userId}/{taskId}/{filename}`.
pub fn image_key(user_id: &str, task_id: &str, filename: &str) -> String {
    format!("{}/{}/{}", user_id, task_id, filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_user_then_task_then_filename() {
        assert_eq!(image_key("demo-user", "t-1", "cat.png"), "demo-user/t-1/cat.png");
    }
}
