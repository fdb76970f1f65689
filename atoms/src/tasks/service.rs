use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client as DynamoClient;
use std::collections::HashMap;

use super::model::{Task, TaskChanges, TaskKey};
use crate::error::TaskError;

/// Persistent task table keyed by `(taskId, userId)` with a secondary
/// `(userId, createdAt)` ordering.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Point lookup by composite key.
    async fn get(&self, key: &TaskKey) -> Result<Option<Task>, TaskError>;

    /// Unconditional write of a full record.
    async fn put(&self, task: &Task) -> Result<(), TaskError>;

    /// Overwrite every mutable attribute, returning the record as stored.
    async fn update(&self, key: &TaskKey, changes: &TaskChanges) -> Result<Task, TaskError>;

    /// Overwrite `imageLabels` only, returning the record as stored.
    async fn set_labels(&self, key: &TaskKey, labels: &[String]) -> Result<Task, TaskError>;

    /// Delete by key. Deleting an absent record succeeds.
    async fn delete(&self, key: &TaskKey) -> Result<(), TaskError>;

    /// All records owned by `user_id`, in index order (ascending `createdAt`).
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Task>, TaskError>;
}

/// DynamoDB-backed record store.
///
/// Table: partition key `taskId`, sort key `userId`.
/// Index: partition key `userId`, sort key `createdAt`.
#[derive(Clone, Debug)]
pub struct DynamoRecordStore {
    client: DynamoClient,
    table_name: String,
    user_index: String,
}

impl DynamoRecordStore {
    pub fn new(
        client: DynamoClient,
        table_name: impl Into<String>,
        user_index: impl Into<String>,
    ) -> Self {
        Self {
            client,
            table_name: table_name.into(),
            user_index: user_index.into(),
        }
    }
}

#[async_trait]
impl RecordStore for DynamoRecordStore {
    async fn get(&self, key: &TaskKey) -> Result<Option<Task>, TaskError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("taskId", AttributeValue::S(key.task_id.clone()))
            .key("userId", AttributeValue::S(key.user_id.clone()))
            .send()
            .await
            .map_err(|e| TaskError::Store(format!("DynamoDB get_item error: {}", e)))?;

        Ok(result.item().map(item_to_task))
    }

    async fn put(&self, task: &Task) -> Result<(), TaskError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(task_to_item(task)))
            .send()
            .await
            .map_err(|e| TaskError::Store(format!("DynamoDB put_item error: {}", e)))?;

        Ok(())
    }

    async fn update(&self, key: &TaskKey, changes: &TaskChanges) -> Result<Task, TaskError> {
        // `status` is a reserved word, hence the name placeholder.
        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("taskId", AttributeValue::S(key.task_id.clone()))
            .key("userId", AttributeValue::S(key.user_id.clone()))
            .update_expression(
                "SET title = :title, description = :description, dueDate = :dueDate, \
                 #taskStatus = :status, updatedAt = :updatedAt, imageKey = :imageKey, \
                 imageLabels = :imageLabels",
            )
            .expression_attribute_names("#taskStatus", "status")
            .expression_attribute_values(":title", AttributeValue::S(changes.title.clone()))
            .expression_attribute_values(
                ":description",
                AttributeValue::S(changes.description.clone()),
            )
            .expression_attribute_values(":dueDate", optional_string(&changes.due_date))
            .expression_attribute_values(
                ":status",
                AttributeValue::S(changes.status.as_str().to_string()),
            )
            .expression_attribute_values(
                ":updatedAt",
                AttributeValue::S(changes.updated_at.clone()),
            )
            .expression_attribute_values(":imageKey", optional_string(&changes.image_key))
            .expression_attribute_values(":imageLabels", string_list(&changes.image_labels))
            .return_values(ReturnValue::AllNew)
            .send()
            .await
            .map_err(|e| TaskError::Store(format!("DynamoDB update_item error: {}", e)))?;

        result
            .attributes()
            .map(item_to_task)
            .ok_or_else(|| {
                TaskError::Store("DynamoDB update_item returned no attributes".to_string())
            })
    }

    async fn set_labels(&self, key: &TaskKey, labels: &[String]) -> Result<Task, TaskError> {
        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("taskId", AttributeValue::S(key.task_id.clone()))
            .key("userId", AttributeValue::S(key.user_id.clone()))
            .update_expression("SET imageLabels = :imageLabels")
            .expression_attribute_values(":imageLabels", string_list(labels))
            .return_values(ReturnValue::AllNew)
            .send()
            .await
            .map_err(|e| TaskError::Store(format!("DynamoDB update_item error: {}", e)))?;

        result
            .attributes()
            .map(item_to_task)
            .ok_or_else(|| {
                TaskError::Store("DynamoDB update_item returned no attributes".to_string())
            })
    }

    async fn delete(&self, key: &TaskKey) -> Result<(), TaskError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("taskId", AttributeValue::S(key.task_id.clone()))
            .key("userId", AttributeValue::S(key.user_id.clone()))
            .send()
            .await
            .map_err(|e| TaskError::Store(format!("DynamoDB delete_item error: {}", e)))?;

        Ok(())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Task>, TaskError> {
        let result = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(&self.user_index)
            .key_condition_expression("userId = :userId")
            .expression_attribute_values(":userId", AttributeValue::S(user_id.to_string()))
            .send()
            .await
            .map_err(|e| TaskError::Store(format!("DynamoDB query error: {}", e)))?;

        Ok(result.items().iter().map(item_to_task).collect())
    }
}

fn optional_string(value: &Option<String>) -> AttributeValue {
    match value {
        Some(s) => AttributeValue::S(s.clone()),
        None => AttributeValue::Null(true),
    }
}

fn string_list(values: &[String]) -> AttributeValue {
    AttributeValue::L(values.iter().cloned().map(AttributeValue::S).collect())
}

fn item_string(item: &HashMap<String, AttributeValue>, name: &str) -> Option<String> {
    item.get(name)
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string())
}

/// Full record as a DynamoDB item. Absent optionals are written as NULL.
pub fn task_to_item(task: &Task) -> HashMap<String, AttributeValue> {
    HashMap::from([
        ("taskId".to_string(), AttributeValue::S(task.task_id.clone())),
        ("userId".to_string(), AttributeValue::S(task.user_id.clone())),
        ("title".to_string(), AttributeValue::S(task.title.clone())),
        ("description".to_string(), AttributeValue::S(task.description.clone())),
        ("status".to_string(), AttributeValue::S(task.status.as_str().to_string())),
        ("dueDate".to_string(), optional_string(&task.due_date)),
        ("createdAt".to_string(), AttributeValue::S(task.created_at.clone())),
        ("updatedAt".to_string(), AttributeValue::S(task.updated_at.clone())),
        ("imageKey".to_string(), optional_string(&task.image_key)),
        ("imageLabels".to_string(), string_list(&task.image_labels)),
    ])
}

/// Lenient item decoding: missing or mistyped attributes fall back to defaults.
pub fn item_to_task(item: &HashMap<String, AttributeValue>) -> Task {
    Task {
        task_id: item_string(item, "taskId").unwrap_or_default(),
        user_id: item_string(item, "userId").unwrap_or_default(),
        title: item_string(item, "title").unwrap_or_default(),
        description: item_string(item, "description").unwrap_or_default(),
        status: item_string(item, "status")
            .and_then(|s| s.parse().ok())
            .unwrap_or_default(),
        due_date: item_string(item, "dueDate"),
        created_at: item_string(item, "createdAt").unwrap_or_default(),
        updated_at: item_string(item, "updatedAt").unwrap_or_default(),
        image_key: item_string(item, "imageKey"),
        image_labels: item
            .get("imageLabels")
            .and_then(|v| v.as_l().ok())
            .map(|labels| {
                labels
                    .iter()
                    .filter_map(|l| l.as_s().ok().map(|s| s.to_string()))
                    .collect()
            })
            .unwrap_or_default(),
    }
}
