// ABOUTME: YAML loader turning playbook documents into task trees
// ABOUTME: Accepts single playbooks, lists of playbooks and multi-document files

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use serde_yaml::{Mapping, Value as YamlValue};
use std::path::Path;
use tokio::fs;
use tracing::debug;

use super::error::{ParserError, Result};
use super::model::{Playbook, Task, TaskList};

/// Keys of a task mapping that configure the task instead of naming it
const RESERVED_KEYS: [&str; 8] = [
    "name", "vars", "when", "delay", "repeat", "timeout", "threads", "tasks",
];

#[derive(Debug, Clone, Default)]
pub struct PlaybookParser;

impl PlaybookParser {
    pub fn new() -> Self {
        Self
    }

    pub async fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Playbook>> {
        let content = fs::read_to_string(path.as_ref())
            .await
            .map_err(ParserError::IoError)?;
        self.parse_str(&content)
    }

    /// Parse every playbook in `content`, in document order
    pub fn parse_str(&self, content: &str) -> Result<Vec<Playbook>> {
        let mut playbooks = Vec::new();
        for document in serde_yaml::Deserializer::from_str(content) {
            let value = YamlValue::deserialize(document)?;
            match value {
                YamlValue::Null => continue,
                YamlValue::Sequence(items) => {
                    for item in &items {
                        playbooks.push(parse_playbook(item)?);
                    }
                }
                other => playbooks.push(parse_playbook(&other)?),
            }
        }
        debug!("Parsed {} playbooks", playbooks.len());
        Ok(playbooks)
    }

    /// Parse content expected to hold exactly one playbook
    pub fn parse_playbook(&self, content: &str) -> Result<Playbook> {
        let mut playbooks = self.parse_str(content)?;
        match playbooks.len() {
            1 => Ok(playbooks.remove(0)),
            0 => Err(ParserError::MissingField("playbook".to_string())),
            n => Err(ParserError::InvalidFormat(format!(
                "expected one playbook, found {}",
                n
            ))),
        }
    }
}

fn parse_playbook(value: &YamlValue) -> Result<Playbook> {
    let mapping = value
        .as_mapping()
        .ok_or_else(|| ParserError::InvalidFormat("a playbook must be a mapping".to_string()))?;

    let id = match mapping.get("id") {
        Some(value) => scalar_string(value, "id")?,
        None => return Err(ParserError::MissingField("id".to_string())),
    };
    if id.trim().is_empty() {
        return Err(ParserError::MissingField("id".to_string()));
    }

    let mut playbook = Playbook::new(id);
    if let Some(name) = mapping.get("name") {
        playbook.name = Some(scalar_string(name, "name")?);
    }
    if let Some(vars) = mapping.get("vars") {
        playbook.vars = parse_vars(vars, &playbook.id)?;
    }

    let tasks = mapping
        .get("workflow")
        .or_else(|| mapping.get("tasks"))
        .ok_or_else(|| ParserError::MissingField(format!("workflow in playbook '{}'", playbook.id)))?;
    playbook.tasks = parse_task_list(tasks, &playbook.id)?;

    Ok(playbook)
}

fn parse_task_list(value: &YamlValue, path: &str) -> Result<TaskList> {
    match value {
        YamlValue::Null => Ok(Vec::new()),
        YamlValue::Sequence(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| parse_task(item, &format!("{}[{}]", path, index)))
            .collect(),
        _ => Err(ParserError::InvalidFormat(format!(
            "{}: expected a list of tasks",
            path
        ))),
    }
}

fn parse_task(value: &YamlValue, path: &str) -> Result<Task> {
    match value {
        YamlValue::String(id) => Ok(Task::new(id.clone())),
        YamlValue::Mapping(mapping) => parse_task_mapping(mapping, path),
        _ => Err(ParserError::InvalidFormat(format!(
            "{}: a task must be a name or a mapping",
            path
        ))),
    }
}

fn parse_task_mapping(mapping: &Mapping, path: &str) -> Result<Task> {
    let mut keys = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        let key = key.as_str().ok_or_else(|| {
            ParserError::InvalidFormat(format!("{}: task keys must be strings", path))
        })?;
        keys.push((key, value));
    }

    // The id is the first unreserved key; a lone `when` names the when task itself
    let id_index = keys
        .iter()
        .position(|(key, _)| !RESERVED_KEYS.contains(key))
        .or_else(|| keys.iter().position(|(key, _)| *key == "when"))
        .ok_or_else(|| ParserError::MissingField(format!("task id at {}", path)))?;

    let (id, id_value) = keys[id_index];
    let mut task = task_with_value(id, id_value, path)?;
    let path = format!("{}.{}", path, task.id);

    for (index, (key, value)) in keys.into_iter().enumerate() {
        if index == id_index {
            continue;
        }
        match key {
            "name" => task.name = Some(scalar_string(value, &path)?),
            "vars" => task.vars.extend(parse_vars(value, &path)?),
            "when" => task.when = Some(scalar_string(value, &path)?),
            "delay" => task.delay = integer(value, key, &path)?,
            "repeat" => task.repeat = integer(value, key, &path)?,
            "timeout" => task.timeout = integer(value, key, &path)?,
            "threads" => task.threads = integer(value, key, &path)? as usize,
            "tasks" => {
                if !task.tasks.is_empty() {
                    return Err(ParserError::InvalidFormat(format!(
                        "{}: children given both inline and under `tasks`",
                        path
                    )));
                }
                task.tasks = parse_task_list(value, &path)?;
            }
            _ => {
                task.vars.insert(key.to_string(), to_json(value, &path)?);
            }
        }
    }

    Ok(task)
}

/// Build a task from its id key; the value is its data or inline children
fn task_with_value(id: &str, value: &YamlValue, path: &str) -> Result<Task> {
    let task = Task::new(id);
    match value {
        YamlValue::Null => Ok(task),
        YamlValue::Sequence(_) => {
            let children = parse_task_list(value, &format!("{}.{}", path, id))?;
            Ok(task.with_tasks(children))
        }
        _ => Ok(task.with_data(scalar_string(value, path)?)),
    }
}

fn parse_vars(value: &YamlValue, path: &str) -> Result<IndexMap<String, JsonValue>> {
    match value {
        YamlValue::Null => Ok(IndexMap::new()),
        YamlValue::Mapping(mapping) => mapping
            .iter()
            .map(|(key, value)| -> Result<(String, JsonValue)> {
                let key = key.as_str().ok_or_else(|| {
                    ParserError::InvalidFormat(format!("{}: var names must be strings", path))
                })?;
                Ok((key.to_string(), to_json(value, path)?))
            })
            .collect(),
        _ => Err(ParserError::InvalidFormat(format!(
            "{}: vars must be a mapping",
            path
        ))),
    }
}

fn scalar_string(value: &YamlValue, path: &str) -> Result<String> {
    match value {
        YamlValue::String(s) => Ok(s.clone()),
        YamlValue::Number(n) => Ok(n.to_string()),
        YamlValue::Bool(b) => Ok(b.to_string()),
        _ => Err(ParserError::InvalidFormat(format!(
            "{}: expected a scalar value",
            path
        ))),
    }
}

fn integer(value: &YamlValue, key: &str, path: &str) -> Result<u64> {
    value.as_u64().ok_or_else(|| {
        ParserError::InvalidFormat(format!(
            "{}: `{}` must be a non-negative integer",
            path, key
        ))
    })
}

fn to_json(value: &YamlValue, path: &str) -> Result<JsonValue> {
    serde_json::to_value(value)
        .map_err(|e| ParserError::InvalidFormat(format!("{}: {}", path, e)))
}
