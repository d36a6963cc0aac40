use std::env;
use std::sync::Arc;

use youtube_account_manager::commands::{
    delete_account, get_account_detail, get_account_overview, get_authorization_url,
    import_csv_accounts, import_manual_account, list_accounts, save_csv_template,
    toggle_account_status,
};
use youtube_account_manager::core::models::AccountRecord;
use youtube_account_manager::utils::logging::{init_tracing, init_tracing_with};
use youtube_account_manager::{AccountsView, AppState, ChangeSource, ManualAccountForm};

const USAGE: &str = "Usage: accounts_cli <command> [args]

Commands:
  list [all|active|inactive]
  show <id>
  add <name> <email> [channel-id]
  toggle <id>
  delete <id>
  summary
  import-csv <file>
  template [path]
  auth-url
  watch";

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{USAGE}");
        std::process::exit(1);
    };

    // Default filter while configuration loads, then the configured level
    init_tracing();
    let state = match AppState::new() {
        Ok(state) => state,
        Err(error) => {
            eprintln!("Error: {error:#}");
            std::process::exit(1);
        }
    };

    let log_level = state.config.read().await.advanced.log_level.clone();
    init_tracing_with(Some(&log_level));

    if let Err(error) = run(&state, command, &args[1..]).await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run(state: &AppState, command: &str, args: &[String]) -> Result<(), String> {
    let arg = |index: usize, name: &str| {
        args.get(index)
            .cloned()
            .ok_or_else(|| format!("missing <{name}>\n\n{USAGE}"))
    };

    match command {
        "list" => {
            let accounts = list_accounts(state, args.first().cloned()).await?;
            accounts.iter().for_each(print_account);
        }
        "show" => {
            let detail = get_account_detail(state, arg(0, "id")?).await?;
            print_account(&detail.account);
            println!("  {}", detail.channel_url);
            for day in detail.weekly_stats {
                println!(
                    "  {:<10} +{:>4} subs  {:>6} views  ${:.0}",
                    day.day, day.subscribers, day.views, day.revenue
                );
            }
        }
        "add" => {
            let mut form = ManualAccountForm::new(arg(0, "name")?, arg(1, "email")?);
            form.channel_id = args.get(2).cloned().unwrap_or_default();
            let account = import_manual_account(state, form).await?;
            println!("Account added");
            print_account(&account);
        }
        "toggle" => match toggle_account_status(state, arg(0, "id")?).await? {
            Some(account) => print_account(&account),
            None => return Err("account not found".to_string()),
        },
        "delete" => {
            if !delete_account(state, arg(0, "id")?).await? {
                return Err("account not found".to_string());
            }
            println!("Deleted");
        }
        "summary" => {
            let overview = get_account_overview(state).await?;
            let summary = overview.summary;
            println!(
                "Accounts:    {} ({} active, {} inactive)",
                summary.total_accounts, overview.active_accounts, overview.inactive_accounts
            );
            println!("Subscribers: {}", summary.total_subscribers);
            println!("Views:       {}", summary.total_views);
            println!("Videos:      {}", summary.total_videos);
            println!(
                "Revenue:     ${:.2} (avg ${:.2})",
                summary.total_revenue, overview.average_revenue
            );
        }
        "import-csv" => {
            let report = import_csv_accounts(state, arg(0, "file")?).await?;
            println!("{} accounts imported from CSV", report.imported.len());
            for skipped in report.skipped {
                println!("  skipped row {}: {}", skipped.row, skipped.reason);
            }
        }
        "template" => {
            let target = args.first().cloned().unwrap_or_else(|| ".".to_string());
            println!("{}", save_csv_template(target).await?);
        }
        "auth-url" => {
            let info = get_authorization_url(state).await?;
            println!("{}\nstate: {}", info.url, info.state);
        }
        "watch" => watch(state).await?,
        other => return Err(format!("unknown command '{other}'\n\n{USAGE}")),
    }

    Ok(())
}

/// Print the summary line again whenever any process changes the collection
async fn watch(state: &AppState) -> Result<(), String> {
    let view = AccountsView::mount(Arc::clone(&state.store));
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let _subscription = state.store.bus().subscribe(Arc::new(move || {
        let _ = tx.send(());
    }));

    println!("Watching for changes, Ctrl+C to stop");
    loop {
        {
            let snapshot = view.snapshot();
            println!(
                "{} accounts, {} subscribers",
                snapshot.summary.total_accounts, snapshot.summary.total_subscribers
            );
        }

        tokio::select! {
            received = rx.recv() => {
                if received.is_none() {
                    return Ok(());
                }
            }
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}

fn print_account(account: &AccountRecord) {
    println!(
        "{:>3}  {:<24} {:<28} {:>8} subs  {}",
        account.id,
        account.name,
        account.email,
        account.subscribers,
        if account.is_active { "active" } else { "inactive" }
    );
}
