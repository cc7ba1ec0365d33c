//! Output renderers and formatting helpers for CLI commands.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use anyhow::anyhow;
use ensync_domain::{
    AccessKey, AccessKeyList, AccessKeyPermissions, AccessKeyType, Event, EventList, Permissions,
    ServiceKeyPair, Workspace, WorkspaceList,
};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

/// Print `value` as two-space indented JSON.
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

fn render<T: Serialize>(
    value: &T,
    format: OutputFormat,
    table: impl FnOnce(&T) -> String,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => {
            print!("{}", table(value));
            Ok(())
        }
    }
}

pub(crate) fn render_event_list(list: &EventList, format: OutputFormat) -> CliResult<()> {
    render(list, format, event_table)
}

pub(crate) fn render_event(event: &Event, format: OutputFormat) -> CliResult<()> {
    render(event, format, event_detail)
}

pub(crate) fn render_access_key_list(list: &AccessKeyList, format: OutputFormat) -> CliResult<()> {
    render(list, format, access_key_table)
}

pub(crate) fn render_access_key(key: &AccessKeyPermissions, format: OutputFormat) -> CliResult<()> {
    render(key, format, access_key_detail)
}

pub(crate) fn render_created_key(key: &AccessKey, format: OutputFormat) -> CliResult<()> {
    render(key, format, created_key_detail)
}

pub(crate) fn render_key_pair(pair: &ServiceKeyPair, format: OutputFormat) -> CliResult<()> {
    render(pair, format, key_pair_detail)
}

pub(crate) fn render_workspace_list(list: &WorkspaceList, format: OutputFormat) -> CliResult<()> {
    render(list, format, workspace_table)
}

fn event_table(list: &EventList) -> String {
    let mut out = format!("{:<24} {:<32} {:<20} FIELDS\n", "ID", "NAME", "CREATED");
    for event in &list.results {
        let _ = writeln!(
            out,
            "{:<24} {:<32} {:<20} {}",
            or_dash(&event.id),
            event.name,
            format_timestamp(event.created_at.as_ref()),
            event.payload.len()
        );
    }
    let _ = writeln!(out, "total: {}", list.results_length);
    out
}

fn event_detail(event: &Event) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "id: {}", or_dash(&event.id));
    let _ = writeln!(out, "name: {}", event.name);
    let _ = writeln!(out, "created: {}", format_timestamp(event.created_at.as_ref()));
    let _ = writeln!(out, "updated: {}", format_timestamp(event.updated_at.as_ref()));
    if event.payload.is_empty() {
        out.push_str("payload: {}\n");
    } else {
        out.push_str("payload:\n");
        for (key, value) in &event.payload {
            let _ = writeln!(out, "  {key}: {value}");
        }
    }
    out
}

fn access_key_table(list: &AccessKeyList) -> String {
    let mut out = format!(
        "{:<24} {:<24} {:<8} {:<20} {:<20} RECEIVE\n",
        "ID", "NAME", "TYPE", "CREATED", "SEND"
    );
    for key in &list.results {
        let (send, receive) = key.permissions.as_ref().map_or_else(
            || ("-".to_string(), "-".to_string()),
            |permissions| (channels(&permissions.send), channels(&permissions.receive)),
        );
        let _ = writeln!(
            out,
            "{:<24} {:<24} {:<8} {:<20} {:<20} {}",
            or_dash(&key.id),
            or_dash(&key.name),
            key.key_type.map_or("-", AccessKeyType::as_str),
            format_timestamp(key.created_at.as_ref()),
            send,
            receive
        );
    }
    let _ = writeln!(out, "total: {}", list.results_length);
    out
}

fn access_key_detail(key: &AccessKeyPermissions) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "id: {}", or_dash(&key.id));
    let _ = writeln!(out, "key: {}", or_dash(&key.key));
    let _ = writeln!(out, "name: {}", or_dash(&key.name));
    if let Some(kind) = key.key_type {
        let _ = writeln!(out, "type: {kind}");
    }
    let _ = writeln!(out, "created: {}", format_timestamp(key.created_at.as_ref()));
    write_permissions(&mut out, key.permissions.as_ref());
    if !key.service_key_id.is_empty() {
        let _ = writeln!(out, "service key: {}", key.service_key_id);
    }
    out
}

fn created_key_detail(key: &AccessKey) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "id: {}", or_dash(&key.id));
    let _ = writeln!(out, "access key: {}", key.access_key);
    if !key.name.is_empty() {
        let _ = writeln!(out, "name: {}", key.name);
    }
    write_permissions(&mut out, key.permissions.as_ref());
    if let Some(pair) = &key.service_key_pair {
        out.push_str(&key_pair_detail(pair));
    }
    out
}

fn key_pair_detail(pair: &ServiceKeyPair) -> String {
    let mut out = format!("public key: {}\n", pair.public_key);
    if let Some(private_key) = &pair.private_key {
        let _ = writeln!(out, "private key: {private_key}");
        out.push_str("store the private key now; it is not shown again\n");
    }
    out
}

fn workspace_table(list: &WorkspaceList) -> String {
    let mut out = format!("{:<24} {:<32} {:<20} PATH\n", "ID", "NAME", "CREATED");
    for workspace in &list.results {
        write_workspace(&mut out, workspace, 0);
    }
    let _ = writeln!(out, "total: {}", list.results_length);
    out
}

fn write_workspace(out: &mut String, workspace: &Workspace, depth: usize) {
    let name = format!("{}{}", "  ".repeat(depth), workspace.name);
    let _ = writeln!(
        out,
        "{:<24} {:<32} {:<20} {}",
        or_dash(&workspace.id),
        name,
        format_timestamp(workspace.created_at.as_ref()),
        or_dash(&workspace.path)
    );
    for child in &workspace.children {
        write_workspace(out, child, depth + 1);
    }
}

fn write_permissions(out: &mut String, permissions: Option<&Permissions>) {
    let Some(permissions) = permissions else {
        out.push_str("permissions: none\n");
        return;
    };
    let _ = writeln!(out, "send: {}", channels(&permissions.send));
    let _ = writeln!(out, "receive: {}", channels(&permissions.receive));
}

fn channels(set: &BTreeSet<String>) -> String {
    if set.is_empty() {
        "-".to_string()
    } else {
        set.iter().map(String::as_str).collect::<Vec<_>>().join(",")
    }
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

fn format_timestamp<T: std::fmt::Display>(value: Option<&T>) -> String {
    value.map_or_else(|| "-".to_string(), ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ensync_domain::JsonObject;
    use serde_json::json;

    fn sample_events() -> EventList {
        serde_json::from_value(json!({
            "resultsLength": 2,
            "results": [
                {
                    "id": "evt-1",
                    "name": "orders.created",
                    "payload": {"orderId": "string", "total": "number"}
                },
                {"id": "evt-2", "name": "orders.shipped", "payload": {}}
            ]
        }))
        .expect("valid event list")
    }

    #[test]
    fn event_table_lists_each_record() {
        let table = event_table(&sample_events());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("ID"));
        assert!(lines[1].contains("orders.created"));
        assert!(lines[1].trim_end().ends_with('2'));
        assert!(lines[2].contains("orders.shipped"));
        assert_eq!(lines[3], "total: 2");
    }

    #[test]
    fn event_detail_expands_payload() {
        let mut payload = JsonObject::new();
        payload.insert("orderId".into(), json!("string"));
        let detail = event_detail(&Event::new("orders.created", payload));
        assert!(detail.contains("id: -\n"));
        assert!(detail.contains("  orderId: \"string\"\n"));
    }

    #[test]
    fn access_key_detail_lists_channels() {
        let key = AccessKeyPermissions {
            id: "ak-1".into(),
            key: "secret-key".into(),
            name: "billing".into(),
            key_type: Some(AccessKeyType::Service),
            permissions: Some(Permissions::new(["orders", "payments"], ["*"])),
            ..AccessKeyPermissions::default()
        };
        let detail = access_key_detail(&key);
        assert!(detail.contains("type: SERVICE\n"));
        assert!(detail.contains("send: orders,payments\n"));
        assert!(detail.contains("receive: *\n"));
    }

    #[test]
    fn private_key_is_flagged_as_one_time() {
        let pair = ServiceKeyPair {
            public_key: "pub".into(),
            private_key: Some("priv".into()),
        };
        let detail = key_pair_detail(&pair);
        assert!(detail.contains("private key: priv\n"));
        assert!(detail.contains("not shown again"));

        let public_only = ServiceKeyPair {
            public_key: "pub".into(),
            private_key: None,
        };
        assert_eq!(key_pair_detail(&public_only), "public key: pub\n");
    }

    #[test]
    fn workspace_children_are_indented() {
        let list: WorkspaceList = serde_json::from_value(json!({
            "resultsLength": 1,
            "results": [{
                "id": "ws-1",
                "name": "root",
                "path": "/root",
                "children": [{
                    "id": "ws-2",
                    "name": "child",
                    "parentId": "ws-1",
                    "path": "/root/child"
                }]
            }]
        }))
        .expect("valid workspace list");

        let table = workspace_table(&list);
        let lines: Vec<&str> = table.lines().collect();
        assert!(lines[1].contains(" root "));
        assert!(lines[2].contains("   child "));
        assert!(lines[2].contains("/root/child"));
    }
}
