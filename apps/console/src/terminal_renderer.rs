use grantdesk_application::{MessageKind, ViewDirective, ViewRenderer};
use grantdesk_domain::{UserListRow, UserPermissionRecord};
use tracing::{debug, warn};

/// Renders directives to stdout, either for a human or as JSON lines.
pub struct TerminalRenderer {
    json: bool,
}

impl TerminalRenderer {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    fn render_json(directive: &ViewDirective) {
        match serde_json::to_string(directive) {
            Ok(line) => println!("{line}"),
            Err(error) => warn!(error = %error, "failed to serialize view directive"),
        }
    }
}

impl ViewRenderer for TerminalRenderer {
    fn apply(&self, directive: ViewDirective) {
        if self.json {
            Self::render_json(&directive);
            return;
        }

        match directive {
            ViewDirective::ShowMessage { title, text, kind } => match kind {
                MessageKind::Danger | MessageKind::Warning => eprintln!("{title}: {text}"),
                MessageKind::Success | MessageKind::Info => println!("{title}: {text}"),
            },
            ViewDirective::RenderUserList { rows } => print_user_list(&rows),
            ViewDirective::RenderUserDetail { record } => print_user_detail(&record),
            // Forms, spinners and modals have no terminal counterpart.
            other => debug!(directive = ?other, "view directive"),
        }
    }
}

fn print_user_list(rows: &[UserListRow]) {
    if rows.is_empty() {
        println!("no accounts");
        return;
    }

    let name_width = rows
        .iter()
        .map(|row| row.username.len() + row.host.len() + 5)
        .max()
        .unwrap_or(0)
        .max("ACCOUNT".len());

    println!("{:<name_width$}  PERMISSIONS  GRANT OPTION", "ACCOUNT");
    for row in rows {
        let account = format!("'{}'@'{}'", row.username, row.host);
        let grant_option = if row.has_grant_option { "yes" } else { "no" };
        println!(
            "{account:<name_width$}  {:>11}  {grant_option}",
            row.permission_count
        );
    }
}

fn print_user_detail(record: &UserPermissionRecord) {
    println!("'{}'@'{}'", record.username(), record.host());
    if record.permissions().is_empty() {
        println!("  no permissions");
        return;
    }

    for entry in record.permissions() {
        let target = if entry.all_databases {
            "ALL DATABASES".to_owned()
        } else {
            entry.database_name.clone().unwrap_or_else(|| "-".to_owned())
        };
        let grant_option = if entry.with_grant_option {
            " (with grant option)"
        } else {
            ""
        };
        println!("  {} on {target}{grant_option}", entry.permission_type);
    }
}
