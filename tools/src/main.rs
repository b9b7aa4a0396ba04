//! console-runner: headless driver for the tuition console core.
//!
//! Usage:
//!   console-runner --seed 42 --data-dir ./data --db console.db
//!   console-runner --db console.db --export-dir ./exports
//!   console-runner --db console.db --ipc-mode

use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::env;
use std::io::{self, BufRead, Write};
use std::str::FromStr;
use tuition_core::{
    mailer::{Deliverable, SendQuota},
    query::{SortSpec, View},
    reminder::QuotaUsage,
    sink::{DirectorySink, Download, DownloadSink},
    store::SettingsStore,
    types::Timestamp,
    Console, ConsoleConfig, ConsoleError, Record, ViewState,
};

#[derive(serde::Deserialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum ViewName {
    Payments,
    Receipts,
    Transactions,
    ActivityLog,
}

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Query {
        view: ViewName,
        #[serde(default)]
        filters: BTreeMap<String, String>,
        sort: Option<String>,
        direction: Option<String>,
        page: Option<usize>,
        page_size: Option<usize>,
    },
    Export {
        view: ViewName,
        #[serde(default)]
        filters: BTreeMap<String, String>,
    },
    SendReminders {
        view: ViewName,
        ids: Vec<String>,
        #[serde(default)]
        filters: BTreeMap<String, String>,
    },
    GetQuota,
    Quit,
}

struct Session {
    console: Console,
    page_size_options: Vec<usize>,
    store: SettingsStore,
    exports: Option<DirectorySink>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = string_arg(&args, "--db").unwrap_or(":memory:");
    let data_dir = string_arg(&args, "--data-dir").unwrap_or("./data");
    let export_dir = string_arg(&args, "--export-dir");

    let mut config = ConsoleConfig::load(data_dir)?;
    config.seed = parse_arg(&args, "--seed", config.seed);
    let seed = config.seed;

    if !ipc_mode {
        println!("Tuition console runner");
        println!("  seed:      {seed}");
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        println!();
    }

    let store = SettingsStore::open(db)?;
    store.migrate()?;

    let now = now();
    let mut console = Console::generate(&config, now)?;
    console.quota = SendQuota::load(&store, console.quota, now.date())?;

    let exports = export_dir.map(DirectorySink::new).transpose()?;
    let mut session = Session {
        console,
        page_size_options: config.paging.page_size_options.clone(),
        store,
        exports,
    };

    if ipc_mode {
        run_ipc_loop(&mut session)?;
    } else {
        print_summary(&mut session, now)?;
    }
    Ok(())
}

fn run_ipc_loop(session: &mut Session) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                writeln!(stdout, "{}", serde_json::json!({ "error": e.to_string() }))?;
                stdout.flush()?;
                continue;
            }
        };
        if matches!(cmd, IpcCommand::Quit) {
            break;
        }

        let reply = match handle_command(session, cmd) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Command failed: {e}");
                serde_json::json!({ "error": e.to_string() })
            }
        };
        writeln!(stdout, "{reply}")?;
        stdout.flush()?;
    }
    Ok(())
}

fn handle_command(session: &mut Session, cmd: IpcCommand) -> Result<serde_json::Value> {
    let console = &mut session.console;
    match cmd {
        IpcCommand::Query {
            view,
            filters,
            sort,
            direction,
            page,
            page_size,
        } => {
            if let Some(size) = page_size {
                if !session.page_size_options.contains(&size) {
                    anyhow::bail!(
                        "Page size {size} is not one of {:?}",
                        session.page_size_options
                    );
                }
            }
            let req = PageRequest {
                sort,
                direction,
                page,
                page_size,
            };
            match view {
                ViewName::Payments => query_view(&mut console.payments, &filters, &req),
                ViewName::Receipts => query_view(&mut console.receipts, &filters, &req),
                ViewName::Transactions => query_view(&mut console.transactions, &filters, &req),
                ViewName::ActivityLog => query_view(&mut console.activity_log, &filters, &req),
            }
        }
        IpcCommand::Export { view, filters } => {
            let at = now();
            let download = match view {
                ViewName::Payments => export_view(&mut console.payments, &filters, at)?,
                ViewName::Receipts => export_view(&mut console.receipts, &filters, at)?,
                ViewName::Transactions => export_view(&mut console.transactions, &filters, at)?,
                ViewName::ActivityLog => export_view(&mut console.activity_log, &filters, at)?,
            };
            deliver(session.exports.as_mut(), download)
        }
        IpcCommand::SendReminders { view, ids, filters } => {
            let at = now();
            let outcome = match view {
                ViewName::Payments => {
                    send_view(&mut console.payments, &mut console.quota, &filters, &ids, at)?
                }
                ViewName::Receipts => {
                    send_view(&mut console.receipts, &mut console.quota, &filters, &ids, at)?
                }
                ViewName::Transactions | ViewName::ActivityLog => {
                    anyhow::bail!("Reminders can only be sent from payments or receipts")
                }
            };
            console.quota.save(&session.store)?;
            Ok(outcome)
        }
        IpcCommand::GetQuota => Ok(serde_json::to_value(QuotaUsage::from(&console.quota))?),
        IpcCommand::Quit => Ok(serde_json::Value::Null),
    }
}

struct PageRequest {
    sort: Option<String>,
    direction: Option<String>,
    page: Option<usize>,
    page_size: Option<usize>,
}

fn apply_filters<V: View>(
    state: &mut ViewState<V>,
    filters: &BTreeMap<String, String>,
) -> Result<(), ConsoleError> {
    state.clear_filters();
    for (key, value) in filters {
        state.set_filter(key, value)?;
    }
    state.apply_filters();
    Ok(())
}

fn query_view<V>(
    state: &mut ViewState<V>,
    filters: &BTreeMap<String, String>,
    req: &PageRequest,
) -> Result<serde_json::Value>
where
    V: View,
    V::Record: Serialize,
    <V::Record as Record>::Field: FromStr<Err = ConsoleError>,
{
    apply_filters(state, filters)?;
    state.set_sort(SortSpec::parse(
        req.sort.as_deref(),
        req.direction.as_deref().unwrap_or("asc"),
    )?);
    if let Some(size) = req.page_size {
        state.set_page_size(size)?;
    }
    state.set_page(req.page.unwrap_or(1))?;
    let page = state.current_page();
    Ok(serde_json::json!({
        "view": state.view().slug(),
        "summary": page.summary(),
        "selected": state.selection().len(),
        "page": page,
    }))
}

fn export_view<V: View>(
    state: &mut ViewState<V>,
    filters: &BTreeMap<String, String>,
    at: Timestamp,
) -> Result<Download> {
    apply_filters(state, filters)?;
    Ok(state.export(at))
}

fn send_view<V>(
    state: &mut ViewState<V>,
    quota: &mut SendQuota,
    filters: &BTreeMap<String, String>,
    ids: &[String],
    at: Timestamp,
) -> Result<serde_json::Value>
where
    V: View,
    V::Record: Deliverable,
{
    apply_filters(state, filters)?;
    state.clear_selection();
    for id in ids {
        state.toggle_selection(id);
    }
    let outcome = state.send_selected(quota, at)?;
    Ok(serde_json::json!({
        "result": outcome,
        "notification": outcome.notification(),
        "still_selected": state.selection().ids(),
        "quota": QuotaUsage::from(&*quota),
    }))
}

fn deliver(sink: Option<&mut DirectorySink>, download: Download) -> Result<serde_json::Value> {
    match sink {
        Some(sink) => {
            let path = sink.path_for(&download.filename);
            let filename = download.filename.clone();
            sink.save(download)?;
            Ok(serde_json::json!({
                "filename": filename,
                "path": path.display().to_string(),
            }))
        }
        None => Ok(serde_json::to_value(&download)?),
    }
}

fn print_summary(session: &mut Session, now: Timestamp) -> Result<()> {
    let console = &session.console;
    let payment_total: f64 = console.payments.records().iter().map(|p| p.amount).sum();
    let transaction_total: f64 = console
        .transactions
        .records()
        .iter()
        .map(|t| t.total_amount)
        .sum();
    let usage = QuotaUsage::from(&console.quota);

    println!("=== CONSOLE SUMMARY ===");
    println!(
        "  payments:       {} ({} in view)",
        console.payments.records().len(),
        console.payments.filtered().len()
    );
    println!("  receipts:       {}", console.receipts.records().len());
    println!("  transactions:   {}", console.transactions.records().len());
    println!("  activity log:   {}", console.activity_log.records().len());
    println!("  payment total:  {payment_total:.2} THB");
    println!("  txn total:      {transaction_total:.2} THB");
    println!(
        "  emails today:   {} / {} ({:.1}%)",
        usage.sent_today, usage.daily_limit, usage.percentage
    );

    if let Some(sink) = session.exports.as_mut() {
        let downloads = [
            console.payments.export(now),
            console.receipts.export(now),
            console.transactions.export(now),
            console.activity_log.export(now),
        ];
        println!();
        println!("=== EXPORTS ===");
        for download in downloads {
            println!("  {}", sink.path_for(&download.filename).display());
            sink.save(download)?;
        }
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn now() -> Timestamp {
    chrono::Local::now().naive_local()
}
