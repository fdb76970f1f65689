use taskup_atoms::labels::{LabelDetector, LabelPolicy};
use taskup_atoms::media::{self, BlobStore};
use taskup_atoms::tasks::{
    CreateTaskPayload, RecordStore, Task, TaskChanges, TaskKey, TaskStatus, TaskView,
    UpdateTaskPayload,
};
use taskup_atoms::{timestamp, TaskError};

fn required_title(title: Option<String>) -> Result<String, TaskError> {
    title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| TaskError::InvalidRequest("title is required".to_string()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Attach a fresh download URL when the task has an attachment.
async fn with_download_url(blobs: &dyn BlobStore, task: Task) -> Result<TaskView, TaskError> {
    let image_url = match &task.image_key {
        Some(key) => Some(blobs.download_url(key).await?),
        None => None,
    };
    Ok(TaskView {
        task,
        image_url,
        image_upload_url: None,
    })
}

/// Create a task owned by `user_id`. Status always starts as pending.
///
/// With `hasImage`, the image key is stored on the record whether or not
/// the client ever completes the upload.
pub async fn create_task(
    records: &dyn RecordStore,
    blobs: &dyn BlobStore,
    user_id: &str,
    payload: CreateTaskPayload,
) -> Result<TaskView, TaskError> {
    let title = required_title(payload.title)?;
    let filename = if payload.has_image {
        Some(non_empty(payload.filename).ok_or_else(|| {
            TaskError::InvalidRequest("filename is required when hasImage is set".to_string())
        })?)
    } else {
        None
    };

    let task_id = uuid::Uuid::new_v4().to_string();
    let now = timestamp();

    let mut image_upload_url = None;
    let image_key = match filename {
        Some(filename) => {
            let key = media::image_key(user_id, &task_id, &filename);
            let content_type = payload
                .file_type
                .as_deref()
                .unwrap_or(media::DEFAULT_CONTENT_TYPE);
            image_upload_url = Some(blobs.upload_url(&key, content_type).await?);
            Some(key)
        }
        None => None,
    };

    let task = Task {
        task_id,
        user_id: user_id.to_string(),
        title,
        description: payload.description.unwrap_or_default(),
        status: TaskStatus::Pending,
        due_date: non_empty(payload.due_date),
        created_at: now.clone(),
        updated_at: now,
        image_key,
        image_labels: Vec::new(),
    };

    records.put(&task).await?;

    Ok(TaskView {
        task,
        image_url: None,
        image_upload_url,
    })
}

/// All tasks owned by `user_id`, in index order, each with a download URL
/// when it has an attachment.
pub async fn list_tasks(
    records: &dyn RecordStore,
    blobs: &dyn BlobStore,
    user_id: &str,
) -> Result<Vec<TaskView>, TaskError> {
    let tasks = records.list_for_user(user_id).await?;

    // One signed URL per attached task; URLs expire so nothing is reused.
    let mut views = Vec::with_capacity(tasks.len());
    for task in tasks {
        views.push(with_download_url(blobs, task).await?);
    }
    Ok(views)
}

pub async fn get_task(
    records: &dyn RecordStore,
    blobs: &dyn BlobStore,
    user_id: &str,
    task_id: &str,
) -> Result<TaskView, TaskError> {
    let task = records
        .get(&TaskKey::new(task_id, user_id))
        .await?
        .ok_or(TaskError::NotFound)?;

    with_download_url(blobs, task).await
}

/// Full overwrite of a task's mutable fields.
///
/// Image handling, in order:
/// 1. `hasNewImage` with a filename: delete the old blob (if any), assign a
///    new key and issue an upload URL. Labels are carried over as they were.
/// 2. Otherwise, an existing attachment gets a fresh download URL.
/// 3. Otherwise nothing.
///
/// The old blob is deleted before the new one is uploaded; if the client
/// never uploads, the record points at a missing object.
pub async fn update_task(
    records: &dyn RecordStore,
    blobs: &dyn BlobStore,
    user_id: &str,
    task_id: &str,
    payload: UpdateTaskPayload,
) -> Result<TaskView, TaskError> {
    let title = required_title(payload.title)?;
    let key = TaskKey::new(task_id, user_id);

    let existing = records.get(&key).await?.ok_or(TaskError::NotFound)?;

    let mut image_key = existing.image_key.clone();
    let mut image_url = None;
    let mut image_upload_url = None;

    match non_empty(payload.filename) {
        Some(filename) if payload.has_new_image => {
            if let Some(old_key) = &image_key {
                blobs.delete(old_key).await?;
            }
            let new_key = media::image_key(user_id, task_id, &filename);
            let content_type = payload
                .file_type
                .as_deref()
                .unwrap_or(media::DEFAULT_CONTENT_TYPE);
            image_upload_url = Some(blobs.upload_url(&new_key, content_type).await?);
            image_key = Some(new_key);
        }
        _ => {
            if let Some(current) = &image_key {
                image_url = Some(blobs.download_url(current).await?);
            }
        }
    }

    let changes = TaskChanges {
        title,
        description: payload.description.unwrap_or_default(),
        due_date: non_empty(payload.due_date),
        status: payload.status.unwrap_or(existing.status),
        updated_at: timestamp(),
        image_key,
        image_labels: existing.image_labels,
    };

    let task = records.update(&key, &changes).await?;

    Ok(TaskView {
        task,
        image_url,
        image_upload_url,
    })
}

/// Delete a task and its attachment. Deleting a missing task succeeds.
pub async fn delete_task(
    records: &dyn RecordStore,
    blobs: &dyn BlobStore,
    user_id: &str,
    task_id: &str,
) -> Result<(), TaskError> {
    let key = TaskKey::new(task_id, user_id);

    if let Some(image_key) = records.get(&key).await?.and_then(|t| t.image_key) {
        blobs.delete(&image_key).await?;
    }

    records.delete(&key).await
}

/// Run label detection on the task's stored image and save the labels.
///
/// Does not check that the blob exists; a missing object surfaces as a
/// detector failure, handled per `policy`.
pub async fn process_image(
    records: &dyn RecordStore,
    detector: &dyn LabelDetector,
    user_id: &str,
    task_id: &str,
    policy: LabelPolicy,
) -> Result<Task, TaskError> {
    let key = TaskKey::new(task_id, user_id);

    let image_key = records
        .get(&key)
        .await?
        .and_then(|t| t.image_key)
        .ok_or(TaskError::ImageNotFound)?;

    let labels = policy.apply(&image_key, detector.detect_labels(&image_key).await)?;

    records.set_labels(&key, &labels).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use taskup_atoms::labels::MemoryLabelDetector;
    use taskup_atoms::media::{MemoryBlobStore, SignedUrl};
    use taskup_atoms::tasks::MemoryRecordStore;

    const USER: &str = "demo-user";

    fn create(title: &str) -> CreateTaskPayload {
        CreateTaskPayload {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    fn create_with_image(title: &str, filename: &str) -> CreateTaskPayload {
        CreateTaskPayload {
            title: Some(title.to_string()),
            has_image: true,
            filename: Some(filename.to_string()),
            file_type: Some("image/png".to_string()),
            ..Default::default()
        }
    }

    fn update(title: &str) -> UpdateTaskPayload {
        UpdateTaskPayload {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_without_image_starts_pending_and_unattached() {
        let records = MemoryRecordStore::new();
        let blobs = MemoryBlobStore::new();

        let view = create_task(&records, &blobs, USER, create("Buy milk")).await.unwrap();

        assert_eq!(view.task.status, TaskStatus::Pending);
        assert_eq!(view.task.user_id, USER);
        assert_eq!(view.task.description, "");
        assert!(view.task.image_key.is_none());
        assert!(view.task.image_labels.is_empty());
        assert_eq!(view.task.created_at, view.task.updated_at);
        assert!(view.image_upload_url.is_none());
        assert!(blobs.issued().await.is_empty());
    }

    #[tokio::test]
    async fn create_with_image_assigns_composite_key_and_upload_url() {
        let records = MemoryRecordStore::new();
        let blobs = MemoryBlobStore::new();

        let view = create_task(&records, &blobs, USER, create_with_image("Cat", "cat.png"))
            .await
            .unwrap();

        let expected = format!("{}/{}/cat.png", USER, view.task.task_id);
        assert_eq!(view.task.image_key.as_deref(), Some(expected.as_str()));
        assert!(!view.image_upload_url.unwrap().is_empty());
        assert_eq!(
            blobs.issued().await,
            vec![SignedUrl::Upload {
                key: expected.clone(),
                content_type: "image/png".to_string(),
            }]
        );

        // Stored even though nothing was uploaded.
        let stored = records.get(&view.task.key()).await.unwrap().unwrap();
        assert_eq!(stored.image_key, Some(expected));
    }

    #[tokio::test]
    async fn create_defaults_content_type() {
        let records = MemoryRecordStore::new();
        let blobs = MemoryBlobStore::new();
        let mut payload = create_with_image("Doc", "notes.bin");
        payload.file_type = None;

        create_task(&records, &blobs, USER, payload).await.unwrap();

        match &blobs.issued().await[..] {
            [SignedUrl::Upload { content_type, .. }] => {
                assert_eq!(content_type, "application/octet-stream")
            }
            other => panic!("unexpected signed urls: {:?}", other),
        }
    }

    #[tokio::test]
    async fn create_rejects_missing_title_and_missing_filename() {
        let records = MemoryRecordStore::new();
        let blobs = MemoryBlobStore::new();

        let err = create_task(&records, &blobs, USER, CreateTaskPayload::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::InvalidRequest(_)));

        let mut payload = create("Cat");
        payload.has_image = true;
        let err = create_task(&records, &blobs, USER, payload).await.unwrap_err();
        assert!(matches!(err, TaskError::InvalidRequest(_)));

        assert!(records.is_empty().await);
    }

    #[tokio::test]
    async fn get_round_trips_created_fields_and_adds_image_url() {
        let records = MemoryRecordStore::new();
        let blobs = MemoryBlobStore::new();

        let created = create_task(&records, &blobs, USER, create_with_image("Cat", "cat.png"))
            .await
            .unwrap();
        let fetched = get_task(&records, &blobs, USER, &created.task.task_id)
            .await
            .unwrap();

        assert_eq!(fetched.task, created.task);
        assert!(fetched.image_url.is_some());
        assert!(fetched.image_upload_url.is_none());
    }

    #[tokio::test]
    async fn get_is_scoped_to_caller() {
        let records = MemoryRecordStore::new();
        let blobs = MemoryBlobStore::new();

        let created = create_task(&records, &blobs, "alice", create("Mine")).await.unwrap();
        let err = get_task(&records, &blobs, "bob", &created.task.task_id)
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::NotFound));
    }

    #[tokio::test]
    async fn list_returns_only_callers_tasks_with_download_urls() {
        let records = MemoryRecordStore::new();
        let blobs = MemoryBlobStore::new();

        create_task(&records, &blobs, "alice", create("a1")).await.unwrap();
        create_task(&records, &blobs, "alice", create_with_image("a2", "x.jpg"))
            .await
            .unwrap();
        create_task(&records, &blobs, "bob", create("b1")).await.unwrap();

        let views = list_tasks(&records, &blobs, "alice").await.unwrap();
        assert_eq!(views.len(), 2);
        assert!(views.iter().all(|v| v.task.user_id == "alice"));
        let with_url = views.iter().filter(|v| v.image_url.is_some()).count();
        assert_eq!(with_url, 1);

        assert!(list_tasks(&records, &blobs, "carol").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_overwrites_fields_and_keeps_image() {
        let records = MemoryRecordStore::new();
        let blobs = MemoryBlobStore::new();

        let created = create_task(&records, &blobs, USER, create_with_image("Cat", "cat.png"))
            .await
            .unwrap();
        records
            .set_labels(&created.task.key(), &["Cat".to_string()])
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        let mut payload = update("Cat photo");
        payload.status = Some(TaskStatus::Completed);
        payload.due_date = Some("2024-06-01".to_string());
        let updated = update_task(&records, &blobs, USER, &created.task.task_id, payload)
            .await
            .unwrap();

        assert_eq!(updated.task.title, "Cat photo");
        assert_eq!(updated.task.status, TaskStatus::Completed);
        assert_eq!(updated.task.due_date.as_deref(), Some("2024-06-01"));
        assert_eq!(updated.task.image_key, created.task.image_key);
        assert_eq!(updated.task.image_labels, vec!["Cat"]);
        assert_eq!(updated.task.created_at, created.task.created_at);
        assert!(updated.task.updated_at > created.task.updated_at);
        // Existing attachment gets a download link, not an upload link.
        assert!(updated.image_url.is_some());
        assert!(updated.image_upload_url.is_none());
        assert!(blobs.deleted().await.is_empty());
    }

    #[tokio::test]
    async fn update_without_status_keeps_previous_status_and_clears_omitted_fields() {
        let records = MemoryRecordStore::new();
        let blobs = MemoryBlobStore::new();

        let mut payload = create("Walk dog");
        payload.description = Some("around the block".to_string());
        payload.due_date = Some("2024-06-01".to_string());
        let created = create_task(&records, &blobs, USER, payload).await.unwrap();

        let mut first = update("Walk dog");
        first.status = Some(TaskStatus::InProgress);
        update_task(&records, &blobs, USER, &created.task.task_id, first)
            .await
            .unwrap();

        let updated = update_task(&records, &blobs, USER, &created.task.task_id, update("Walk dog"))
            .await
            .unwrap();
        assert_eq!(updated.task.status, TaskStatus::InProgress);
        assert_eq!(updated.task.description, "");
        assert!(updated.task.due_date.is_none());
    }

    #[tokio::test]
    async fn update_with_new_image_replaces_key_and_carries_labels_over() {
        let records = MemoryRecordStore::new();
        let blobs = MemoryBlobStore::new();

        let created = create_task(&records, &blobs, USER, create_with_image("Cat", "cat.png"))
            .await
            .unwrap();
        let old_key = created.task.image_key.clone().unwrap();
        records
            .set_labels(&created.task.key(), &["Cat".to_string()])
            .await
            .unwrap();

        let mut payload = update("Dog");
        payload.has_new_image = true;
        payload.filename = Some("dog.jpg".to_string());
        payload.file_type = Some("image/jpeg".to_string());
        let updated = update_task(&records, &blobs, USER, &created.task.task_id, payload)
            .await
            .unwrap();

        let new_key = format!("{}/{}/dog.jpg", USER, created.task.task_id);
        assert_eq!(updated.task.image_key.as_deref(), Some(new_key.as_str()));
        assert_eq!(blobs.deleted().await, vec![old_key]);
        assert!(updated.image_upload_url.is_some());
        assert!(updated.image_url.is_none());
        // Labels describe the old image until process-image runs again.
        assert_eq!(updated.task.image_labels, vec!["Cat"]);
    }

    #[tokio::test]
    async fn update_with_new_image_flag_but_no_filename_is_ignored() {
        let records = MemoryRecordStore::new();
        let blobs = MemoryBlobStore::new();

        let created = create_task(&records, &blobs, USER, create("Plain")).await.unwrap();
        let mut payload = update("Plain");
        payload.has_new_image = true;
        let updated = update_task(&records, &blobs, USER, &created.task.task_id, payload)
            .await
            .unwrap();

        assert!(updated.task.image_key.is_none());
        assert!(updated.image_upload_url.is_none());
        assert!(blobs.issued().await.is_empty());
    }

    #[tokio::test]
    async fn update_missing_task_is_not_found() {
        let records = MemoryRecordStore::new();
        let blobs = MemoryBlobStore::new();

        let err = update_task(&records, &blobs, USER, "nope", update("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::NotFound));
    }

    #[tokio::test]
    async fn update_aborts_when_old_blob_delete_fails() {
        let records = MemoryRecordStore::new();
        let blobs = MemoryBlobStore::failing_deletes();

        let created = create_task(&records, &blobs, USER, create_with_image("Cat", "cat.png"))
            .await
            .unwrap();
        let mut payload = update("Dog");
        payload.has_new_image = true;
        payload.filename = Some("dog.jpg".to_string());

        let err = update_task(&records, &blobs, USER, &created.task.task_id, payload)
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Blob(_)));

        let stored = records.get(&created.task.key()).await.unwrap().unwrap();
        assert_eq!(stored, created.task);
    }

    #[tokio::test]
    async fn delete_removes_record_and_blob_and_is_idempotent() {
        let records = MemoryRecordStore::new();
        let blobs = MemoryBlobStore::new();

        let created = create_task(&records, &blobs, USER, create_with_image("Cat", "cat.png"))
            .await
            .unwrap();
        let id = created.task.task_id.clone();

        delete_task(&records, &blobs, USER, &id).await.unwrap();
        delete_task(&records, &blobs, USER, &id).await.unwrap();

        assert!(records.is_empty().await);
        assert_eq!(blobs.deleted().await, vec![created.task.image_key.unwrap()]);
    }

    #[tokio::test]
    async fn process_image_saves_detected_labels() {
        let records = MemoryRecordStore::new();
        let blobs = MemoryBlobStore::new();
        let detector = MemoryLabelDetector::returning(&["Cat", "Pet"]);

        let created = create_task(&records, &blobs, USER, create_with_image("Cat", "cat.png"))
            .await
            .unwrap();
        let task = process_image(
            &records,
            &detector,
            USER,
            &created.task.task_id,
            LabelPolicy::Strict,
        )
        .await
        .unwrap();

        assert_eq!(task.image_labels, vec!["Cat", "Pet"]);
        assert_eq!(task.updated_at, created.task.updated_at);
        assert_eq!(detector.calls().await, vec![created.task.image_key.unwrap()]);
    }

    #[tokio::test]
    async fn process_image_without_attachment_is_not_found() {
        let records = MemoryRecordStore::new();
        let blobs = MemoryBlobStore::new();
        let detector = MemoryLabelDetector::returning(&["Cat"]);

        let created = create_task(&records, &blobs, USER, create("Plain")).await.unwrap();

        for task_id in [created.task.task_id.as_str(), "missing"] {
            let err = process_image(&records, &detector, USER, task_id, LabelPolicy::Strict)
                .await
                .unwrap_err();
            assert!(matches!(err, TaskError::ImageNotFound));
        }
        assert!(detector.calls().await.is_empty());
    }

    #[tokio::test]
    async fn process_image_policies_differ_on_detector_failure() {
        let records = MemoryRecordStore::new();
        let blobs = MemoryBlobStore::new();
        let detector = MemoryLabelDetector::failing();

        let created = create_task(&records, &blobs, USER, create_with_image("Cat", "cat.png"))
            .await
            .unwrap();
        let id = created.task.task_id.as_str();

        let err = process_image(&records, &detector, USER, id, LabelPolicy::Strict)
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Detector(_)));

        let task = process_image(&records, &detector, USER, id, LabelPolicy::Tolerant)
            .await
            .unwrap();
        assert!(task.image_labels.is_empty());
    }
}
