//! Administrative commands and their replies.

use flatview_model::RoleConfig;
use flatview_pipeline::Pipeline;
use serde_json::{Value as Json, json};

use crate::error::{Result, StoreError};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Create a view over `view_on`.
    Create {
        name: String,
        view_on: String,
        pipeline: Pipeline,
    },
    /// Redefine an existing view.
    CollMod {
        name: String,
        view_on: String,
        pipeline: Pipeline,
    },
    CreateRole(RoleConfig),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Create { .. } => "create",
            Command::CollMod { .. } => "collMod",
            Command::CreateRole(_) => "createRole",
        }
    }

    /// Server-shaped command document.
    pub fn to_json(&self) -> Json {
        match self {
            Command::Create {
                name,
                view_on,
                pipeline,
            } => json!({"create": name, "viewOn": view_on, "pipeline": pipeline.to_json()}),
            Command::CollMod {
                name,
                view_on,
                pipeline,
            } => json!({"collMod": name, "viewOn": view_on, "pipeline": pipeline.to_json()}),
            Command::CreateRole(role) => json!({
                "createRole": role.role,
                "privileges": role.privileges,
                "roles": role.roles,
            }),
        }
    }
}

/// Raw reply to a command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResult {
    pub raw: Json,
}

impl CommandResult {
    pub fn ok() -> Self {
        Self { raw: json!({"ok": 1}) }
    }

    /// Failure reply in the server's shape.
    pub fn error(code: i32, code_name: &str, errmsg: impl Into<String>) -> Self {
        Self {
            raw: json!({
                "ok": 0,
                "errmsg": errmsg.into(),
                "code": code,
                "codeName": code_name,
            }),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.raw.get("ok").and_then(Json::as_f64) == Some(1.0)
    }

    /// Turn a non-`ok` reply into [`StoreError::CommandFailed`].
    pub fn check(&self, command: &str) -> Result<()> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(StoreError::CommandFailed {
                command: command.to_string(),
                raw: self.raw.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_accepts_float_ok() {
        let result = CommandResult { raw: json!({"ok": 1.0}) };
        assert!(result.check("create").is_ok());
    }

    #[test]
    fn test_check_surfaces_raw_reply() {
        let result = CommandResult::error(48, "NamespaceExists", "view already exists");
        match result.check("create") {
            Err(StoreError::CommandFailed { command, raw }) => {
                assert_eq!(command, "create");
                assert_eq!(raw["codeName"], "NamespaceExists");
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_ok_is_failure() {
        let result = CommandResult { raw: json!({}) };
        assert!(result.check("collMod").is_err());
    }

    #[test]
    fn test_create_role_document() {
        let role: RoleConfig = serde_json::from_value(json!({
            "role": "analyst",
            "privileges": [{"resource": {"db": "healthcare", "collection": "flatten_view"}, "actions": ["find"]}],
        }))
        .unwrap();
        let doc = Command::CreateRole(role).to_json();
        assert_eq!(doc["createRole"], "analyst");
        assert_eq!(doc["roles"], json!([]));
        assert_eq!(doc["privileges"][0]["resource"]["db"], "healthcare");
    }
}
