use blazecss_lib::config::Settings;
use blazecss_lib::service::ClassService;
use blazecss_lib::watcher::StylesheetWatcher;
use blazecss_lib::SourceKind;
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const BLAZECSS_INTRO: &str = r#"
        ____  __                 ______________
       / __ )/ /___ _____  ___  / ____/ ___/ ___/
      / __  / / __ `/_  / / _ \/ /    \__ \\__ \
     / /_/ / / /_/ / / /_/  __/ /___ ___/ /__/ /
    /_____/_/\__,_/ /___/\___/\____//____/____/

    Welcome to BlazeCSS - Global class completion for CSS Modules!
"#;

#[derive(Parser)]
#[command(name = "BlazeCSS")]
#[command(about = "Extract global CSS classes for completion and hover")]
struct Args {
    /// Workspace root containing blazecss.toml.
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Entry stylesheet, overriding blazecss.toml.
    #[arg(short, long)]
    entry: Option<String>,

    /// Log debug output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List global classes with their properties.
    Classes {
        #[arg(short, long, default_value = "")]
        filter: String,
    },
    /// Show the property block of one class.
    Hover { class: String },
    /// Complete class names for a line of source.
    Complete {
        #[arg(short, long)]
        line: String,
        /// Character offset of the cursor; end of line when omitted.
        #[arg(short, long)]
        cursor: Option<usize>,
        #[arg(short, long, value_enum, default_value_t = Kind::Markup)]
        kind: Kind,
        /// Document being edited; its file type overrides `--kind`.
        #[arg(short, long)]
        document: Option<PathBuf>,
    },
    /// Rebuild the index whenever a stylesheet changes.
    Watch,
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Stylesheet,
    Markup,
}

impl From<Kind> for SourceKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Stylesheet => SourceKind::Stylesheet,
            Kind::Markup => SourceKind::Markup,
        }
    }
}

fn main() {
    let args: Args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut settings = match Settings::load(&args.root) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error loading settings: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(entry) = args.entry {
        settings.entry_stylesheet = Some(entry);
    }

    let service = ClassService::new(args.root.clone(), settings);

    match args.command {
        Command::Classes { filter } => {
            for entry in service.panel(&filter) {
                println!(".{} {{\n{}\n}}\n", entry.class_name, indent(&entry.properties_text));
            }
        }
        Command::Hover { class } => match service.hover(class.trim_start_matches('.'), 0) {
            Some(hover) => println!(".{} {{\n{}\n}}", hover.class_name, indent(&hover.css)),
            None => {
                eprintln!("Unknown class: {}", class);
                std::process::exit(1);
            }
        },
        Command::Complete {
            line,
            cursor,
            kind,
            document,
        } => {
            let cursor = cursor.unwrap_or_else(|| line.chars().count());
            let items = match document {
                Some(document) => match service.complete_in(&args.root.join(document), &line, cursor) {
                    Ok(items) => items,
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        std::process::exit(1);
                    }
                },
                None => service.complete(&line, cursor, kind.into()),
            };
            for item in items {
                println!("{}\t{:?}", item.label, item.insert_text);
            }
        }
        Command::Watch => watch(service),
    }
}

fn watch(service: ClassService) {
    println!("{}", BLAZECSS_INTRO);

    let service = Arc::new(service);
    let _watcher = match StylesheetWatcher::start(Arc::clone(&service)) {
        Ok(watcher) => watcher,
        Err(e) => {
            eprintln!("Error starting watcher: {}", e);
            std::process::exit(1);
        }
    };

    let mut last_count = None;
    loop {
        if service.cache().is_stale() {
            let count = service.panel("").len();
            if last_count != Some(count) {
                info!("{} global classes available", count);
                last_count = Some(count);
            }
        }
        thread::sleep(Duration::from_secs(1));
    }
}

fn indent(block: &str) -> String {
    block
        .lines()
        .map(|line| format!("  {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}
