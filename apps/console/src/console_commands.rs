use std::path::Path;

use clap::Args;
use grantdesk_application::{BatchEntry, FormController, FormEvent, PermissionConsoleService};
use grantdesk_core::{AppError, AppResult};
use grantdesk_domain::{
    AccountIdentity, FieldName, FormAction, PermissionType, Scope, ScopeType, SubScope,
};

/// Inputs of one grant or revoke form.
#[derive(Debug, Clone, Args)]
pub struct FormArgs {
    /// Target account as user@host or 'user'@'host'.
    pub account: AccountIdentity,

    /// Scope type: DATABASE, TABLE, VIEW, MATERIALIZED_VIEW or SYSTEM.
    #[arg(long)]
    pub scope: ScopeType,

    /// Sub-scope for TABLE, VIEW and MATERIALIZED_VIEW, e.g. ALL_TABLES_IN_DATABASE.
    #[arg(long)]
    pub sub_scope: Option<SubScope>,

    /// Database holding the target objects.
    #[arg(long)]
    pub database: Option<String>,

    /// Table name for SINGLE_TABLE.
    #[arg(long)]
    pub table: Option<String>,

    /// View name for SINGLE_VIEW.
    #[arg(long)]
    pub view: Option<String>,

    /// Target every database (DATABASE scope only).
    #[arg(long)]
    pub all_databases: bool,

    /// Permission type; repeat for several, e.g. --permission SELECT --permission "CREATE TABLE".
    #[arg(long = "permission", short = 'p', required = true)]
    pub permissions: Vec<PermissionType>,

    /// Let the account pass the permissions on (grant only).
    #[arg(long)]
    pub with_grant_option: bool,

    /// Print the payload and statements instead of sending them.
    #[arg(long)]
    pub dry_run: bool,
}

/// Drives a form through the same events a browser would emit, then submits.
pub async fn run_form(
    service: &PermissionConsoleService,
    action: FormAction,
    args: FormArgs,
) -> AppResult<()> {
    let mut controller = FormController::new(action);
    service.open_form(&controller);

    for event in reported(service, form_events(&args))? {
        service.dispatch(&mut controller, event)?;
    }
    if args.with_grant_option {
        service.dispatch(&mut controller, FormEvent::GrantOptionToggled(true))?;
    }

    if args.dry_run {
        let request = reported(service, controller.prepare_submission())?;
        let payload = serde_json::to_string_pretty(&request).map_err(|error| {
            AppError::Internal(format!("failed to serialize request: {error}"))
        });
        let payload = reported(service, payload)?;
        println!("{payload}");
        for statement in request.statement_preview() {
            println!("{statement};");
        }
        return Ok(());
    }

    service.submit(&mut controller).await.map(|_| ())
}

fn form_events(args: &FormArgs) -> AppResult<Vec<FormEvent>> {
    let mut events = vec![FormEvent::ScopeChanged(args.scope)];
    if let Some(sub_scope) = args.sub_scope {
        events.push(FormEvent::SubScopeChanged(sub_scope));
    }

    let (database_field, object) = match args.scope {
        ScopeType::Database => (FieldName::DatabaseName, None),
        ScopeType::Table => (
            FieldName::TableDatabaseName,
            args.table.as_ref().map(|table| (FieldName::TableName, table)),
        ),
        ScopeType::View | ScopeType::MaterializedView => (
            FieldName::ViewDatabaseName,
            args.view.as_ref().map(|view| (FieldName::ViewName, view)),
        ),
        ScopeType::System => {
            if args.database.is_some() {
                return Err(AppError::Validation(
                    "--database does not apply to scope SYSTEM".to_owned(),
                ));
            }
            (FieldName::DatabaseName, None)
        }
    };

    if args.table.is_some() && args.scope != ScopeType::Table {
        return Err(AppError::Validation(format!(
            "--table does not apply to scope {}",
            args.scope
        )));
    }
    if args.view.is_some() && !matches!(args.scope, ScopeType::View | ScopeType::MaterializedView)
    {
        return Err(AppError::Validation(format!(
            "--view does not apply to scope {}",
            args.scope
        )));
    }

    if let Some(database) = &args.database {
        events.push(FormEvent::FieldEdited {
            field: database_field,
            value: database.clone(),
        });
    }
    if let Some((field, value)) = object {
        events.push(FormEvent::FieldEdited {
            field,
            value: value.clone(),
        });
    }
    if args.all_databases {
        events.push(FormEvent::AllDatabasesToggled(true));
    }

    events.extend(
        args.permissions
            .iter()
            .map(|permission| FormEvent::PermissionToggled {
                permission: *permission,
                checked: true,
            }),
    );
    events.push(FormEvent::IdentityEdited {
        username: args.account.username().to_owned(),
        host: args.account.host().to_owned(),
    });

    Ok(events)
}

/// Reads a JSON array of batch entries and submits it.
pub async fn run_batch(
    service: &PermissionConsoleService,
    action: FormAction,
    file: &Path,
) -> AppResult<()> {
    let entries = reported(service, read_batch_file(file))?;

    service.submit_batch(action, &entries).await.map(|_| ())
}

fn read_batch_file(file: &Path) -> AppResult<Vec<BatchEntry>> {
    let contents = std::fs::read_to_string(file).map_err(|error| {
        AppError::Validation(format!("failed to read {}: {error}", file.display()))
    })?;
    serde_json::from_str(&contents).map_err(|error| {
        AppError::Validation(format!("invalid batch file {}: {error}", file.display()))
    })
}

/// Shows a failure raised outside the service, passing the result through.
pub fn reported<T>(service: &PermissionConsoleService, result: AppResult<T>) -> AppResult<T> {
    if let Err(error) = &result {
        service.report(error);
    }
    result
}

/// Prints every scope pair with its required fields and permission types.
pub fn print_scopes() {
    for scope in Scope::all() {
        let label = match scope.sub_scope() {
            Some(sub_scope) => format!("{} / {}", scope.scope_type(), sub_scope),
            None => scope.scope_type().to_string(),
        };
        let required = scope
            .required_fields()
            .iter()
            .map(FieldName::as_str)
            .collect::<Vec<_>>();
        let permissions = scope
            .permission_vocabulary()
            .iter()
            .map(PermissionType::as_str)
            .collect::<Vec<_>>();

        println!("{label}");
        println!(
            "  required:    {}",
            if required.is_empty() {
                "none".to_owned()
            } else {
                required.join(", ")
            }
        );
        println!("  permissions: {}", permissions.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use clap::Parser;
    use grantdesk_application::{
        FormEvent, MessageKind, PermissionConsoleService, ViewDirective, ViewRenderer,
    };
    use grantdesk_domain::{FieldName, FormAction, PermissionType, ScopeType};
    use grantdesk_infrastructure::InMemoryPermissionTransport;

    use super::{FormArgs, form_events, run_form};

    #[derive(Default)]
    struct RecordingRenderer {
        directives: Mutex<Vec<ViewDirective>>,
    }

    impl RecordingRenderer {
        fn messages(&self) -> Vec<(MessageKind, String)> {
            self.directives
                .lock()
                .map(|directives| {
                    directives
                        .iter()
                        .filter_map(|directive| match directive {
                            ViewDirective::ShowMessage { kind, text, .. } => {
                                Some((*kind, text.clone()))
                            }
                            _ => None,
                        })
                        .collect()
                })
                .unwrap_or_default()
        }
    }

    impl ViewRenderer for RecordingRenderer {
        fn apply(&self, directive: ViewDirective) {
            if let Ok(mut directives) = self.directives.lock() {
                directives.push(directive);
            }
        }
    }

    fn demo_service() -> (PermissionConsoleService, Arc<RecordingRenderer>) {
        let renderer = Arc::new(RecordingRenderer::default());
        let service = PermissionConsoleService::new(
            Arc::new(InMemoryPermissionTransport::new()),
            renderer.clone(),
        );
        (service, renderer)
    }

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        form: FormArgs,
    }

    fn parse(args: &[&str]) -> FormArgs {
        match Harness::try_parse_from(std::iter::once("grantdesk").chain(args.iter().copied())) {
            Ok(harness) => harness.form,
            Err(error) => panic!("arguments should parse: {error}"),
        }
    }

    #[test]
    fn table_flags_map_to_table_fields() {
        let args = parse(&[
            "alice@%",
            "--scope",
            "table",
            "--database",
            "sales",
            "--table",
            "orders",
            "-p",
            "select",
            "-p",
            "INSERT",
        ]);

        let events = form_events(&args);
        let Ok(events) = events else {
            panic!("events should build");
        };

        assert_eq!(events.first(), Some(&FormEvent::ScopeChanged(ScopeType::Table)));
        assert!(events.contains(&FormEvent::FieldEdited {
            field: FieldName::TableDatabaseName,
            value: "sales".to_owned(),
        }));
        assert!(events.contains(&FormEvent::FieldEdited {
            field: FieldName::TableName,
            value: "orders".to_owned(),
        }));
        assert!(events.contains(&FormEvent::PermissionToggled {
            permission: PermissionType::Insert,
            checked: true,
        }));
    }

    #[test]
    fn multi_word_permission_and_quoted_account_parse() {
        let args = parse(&[
            "'ops'@'10.0.0.%'",
            "--scope",
            "system",
            "--permission",
            "create resource group",
        ]);

        assert_eq!(args.account.host(), "10.0.0.%");
        assert_eq!(args.permissions, vec![PermissionType::CreateResourceGroup]);
    }

    #[test]
    fn object_flag_outside_its_scope_is_rejected() {
        let args = parse(&["alice@%", "--scope", "view", "--table", "orders", "-p", "SELECT"]);
        assert!(form_events(&args).is_err());
    }

    #[tokio::test]
    async fn misplaced_flag_is_reported_once() {
        let (service, renderer) = demo_service();
        let args = parse(&["alice@%", "--scope", "system", "--database", "sales", "-p", "FILE"]);

        assert!(run_form(&service, FormAction::Grant, args).await.is_err());
        assert_eq!(
            renderer.messages(),
            vec![(
                MessageKind::Warning,
                "--database does not apply to scope SYSTEM".to_owned()
            )]
        );
    }

    #[tokio::test]
    async fn rejected_submit_is_reported_once() {
        let (service, renderer) = demo_service();
        let args = parse(&["ghost@%", "--scope", "system", "-p", "FILE"]);

        assert!(run_form(&service, FormAction::Grant, args).await.is_err());
        assert_eq!(
            renderer.messages(),
            vec![(
                MessageKind::Danger,
                "user does not exist: ghost".to_owned()
            )]
        );
    }
}
