//! Resource types as returned by the service.
//!
//! Field names follow the wire format. Everything beyond `id` and `name` is
//! optional so that partial payloads still decode.

#![allow(missing_docs)]

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::core::errors::{CtuError, Result};
use crate::navigator::level::HierarchyLevel;

/// A team in the service's terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub private: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, deserialize_with = "flexible_count")]
    pub task_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "flexible_count")]
    pub task_count: Option<u64>,
    #[serde(default)]
    pub archived: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub id: u64,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub creator: Option<Creator>,
    #[serde(default)]
    pub url: Option<String>,
    /// Milliseconds since the epoch, as a decimal string.
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub date_updated: Option<String>,
}

impl Task {
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.date_created.as_deref().and_then(parse_millis)
    }

    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.date_updated.as_deref().and_then(parse_millis)
    }
}

fn parse_millis(raw: &str) -> Option<DateTime<Utc>> {
    let millis = raw.trim().parse::<i64>().ok()?;
    Utc.timestamp_millis_opt(millis).single()
}

/// Counts arrive as numbers for lists and as strings for folders.
fn flexible_count<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<u64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) => Some(n),
        Some(Raw::Text(text)) => text.trim().parse().ok(),
        None => None,
    })
}

/// Any item that can appear in a navigation frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Resource {
    Workspace(Workspace),
    Space(Space),
    Folder(Folder),
    List(List),
    Task(Task),
}

impl Resource {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Workspace(r) => &r.id,
            Self::Space(r) => &r.id,
            Self::Folder(r) => &r.id,
            Self::List(r) => &r.id,
            Self::Task(r) => &r.id,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Workspace(r) => &r.name,
            Self::Space(r) => &r.name,
            Self::Folder(r) => &r.name,
            Self::List(r) => &r.name,
            Self::Task(r) => &r.name,
        }
    }

    /// Level of the frame this resource is listed in.
    #[must_use]
    pub const fn level(&self) -> HierarchyLevel {
        match self {
            Self::Workspace(_) => HierarchyLevel::Workspace,
            Self::Space(_) => HierarchyLevel::Space,
            Self::Folder(_) => HierarchyLevel::Folder,
            Self::List(_) => HierarchyLevel::List,
            Self::Task(_) => HierarchyLevel::TaskCollection,
        }
    }

    /// Short secondary column shown next to the name.
    #[must_use]
    pub fn summary(&self) -> Option<String> {
        match self {
            Self::Workspace(_) => None,
            Self::Space(space) => space.private.then(|| "private".to_string()),
            Self::Folder(folder) => folder.task_count.map(|n| format!("{n} tasks")),
            Self::List(list) => list.task_count.map(|n| format!("{n} tasks")),
            Self::Task(task) => (!task.status.status.is_empty()).then(|| task.status.status.clone()),
        }
    }

    /// Serialize a collection in its wire shape (a plain JSON array).
    pub fn collection_to_value(items: &[Self]) -> Result<Value> {
        Ok(serde_json::to_value(items)?)
    }

    /// Decode a JSON array of `level` resources.
    pub fn collection_from_value(level: HierarchyLevel, raw: &Value) -> Result<Vec<Self>> {
        fn decode<T: for<'de> Deserialize<'de>>(
            level: HierarchyLevel,
            raw: &Value,
            wrap: fn(T) -> Resource,
        ) -> Result<Vec<Resource>> {
            Vec::<T>::deserialize(raw)
                .map(|items| items.into_iter().map(wrap).collect())
                .map_err(|error| CtuError::decode(level.namespace(), error))
        }

        match level {
            HierarchyLevel::Workspace => decode(level, raw, Self::Workspace),
            HierarchyLevel::Space => decode(level, raw, Self::Space),
            HierarchyLevel::Folder => decode(level, raw, Self::Folder),
            HierarchyLevel::List => decode(level, raw, Self::List),
            HierarchyLevel::TaskCollection => decode(level, raw, Self::Task),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn folder_task_count_accepts_string() {
        let folder: Folder =
            serde_json::from_value(json!({"id": "f1", "name": "Road", "task_count": "12"}))
                .expect("decode");
        assert_eq!(folder.task_count, Some(12));
        assert!(!folder.hidden);
    }

    #[test]
    fn list_task_count_accepts_number_or_null() {
        let list: List =
            serde_json::from_value(json!({"id": "l1", "name": "Q1", "task_count": 3}))
                .expect("decode");
        assert_eq!(list.task_count, Some(3));
        let list: List =
            serde_json::from_value(json!({"id": "l2", "name": "Q2", "task_count": null}))
                .expect("decode");
        assert_eq!(list.task_count, None);
    }

    #[test]
    fn task_dates_parse_from_millis() {
        let task: Task = serde_json::from_value(json!({
            "id": "t1",
            "name": "Ship",
            "status": {"status": "open", "color": "#d3d3d3", "type": "open"},
            "creator": {"id": 7, "username": "ana"},
            "date_created": "1700000000000"
        }))
        .expect("decode");
        assert_eq!(task.status.kind.as_deref(), Some("open"));
        assert_eq!(task.created_at().map(|t| t.timestamp()), Some(1_700_000_000));
        assert_eq!(task.updated_at(), None);
    }

    #[test]
    fn collection_round_trips_through_value() {
        let items = vec![
            Resource::Space(Space {
                id: "s1".into(),
                name: "Eng".into(),
                private: true,
            }),
            Resource::Space(Space {
                id: "s2".into(),
                name: "Ops".into(),
                private: false,
            }),
        ];
        let value = Resource::collection_to_value(&items).expect("encode");
        assert_eq!(value[0]["id"], "s1");
        let back = Resource::collection_from_value(HierarchyLevel::Space, &value).expect("decode");
        assert_eq!(back, items);
    }

    #[test]
    fn collection_shape_mismatch_is_decode_error() {
        let err = Resource::collection_from_value(HierarchyLevel::List, &json!({"lists": []}))
            .expect_err("not an array");
        assert_eq!(err.code(), "CTU-2004");
    }

    #[test]
    fn summary_per_level() {
        let task = Resource::Task(Task {
            id: "t".into(),
            name: "n".into(),
            status: TaskStatus {
                status: "in progress".into(),
                ..TaskStatus::default()
            },
            description: None,
            creator: None,
            url: None,
            date_created: None,
            date_updated: None,
        });
        assert_eq!(task.summary().as_deref(), Some("in progress"));
        assert_eq!(task.level(), HierarchyLevel::TaskCollection);
        let ws = Resource::Workspace(Workspace {
            id: "1".into(),
            name: "Acme".into(),
            color: None,
        });
        assert_eq!(ws.summary(), None);
        assert_eq!(ws.name(), "Acme");
    }
}
