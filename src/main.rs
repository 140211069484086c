use soak::{
    cli::Opts,
    errors::SoakError,
    executor::{suite, Context, Interrupt, RunStatus},
    mail::{self, Smtp},
    picker::toml::Config,
    printer,
    report::{self, ReportInfo},
};

use std::{
    convert::TryFrom,
    fs::{self, File},
    path::Path,
    sync::Mutex,
};
use structopt::StructOpt;
use tokio::runtime;
use tracing::{warn, Level};
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

fn dry_run(suites: &[suite::Suite]) {
    use colored::*;
    for suite in suites {
        for path in &suite.paths {
            println!(
                "{}{}{}\n  {}",
                suite.config.name.blue(),
                ":".blue(),
                path.to_string_lossy().blue(),
                suite.command_for(path)
            );
        }
    }
}

/// Log to the console and to `log_path` at `level`. `RUST_LOG` overrides it.
fn init_logging(log_path: &Path, level: Level) -> Result<(), SoakError> {
    if let Some(dir) = log_path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|err| SoakError::report(dir, err))?;
    }
    let file = File::create(log_path).map_err(|err| SoakError::report(log_path, err))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(LevelFilter::from_level(level).into())
    });
    let file_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false);
    let console_layer = fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();
    Ok(())
}

fn run() -> Result<i32, SoakError> {
    let opts = Opts::from_args();
    let conf = Config::from_path(&opts.dir)?;
    let include = opts.include()?;
    let exclude = opts.exclude()?;

    // Globs and report paths are relative to the directory of soak.toml.
    std::env::set_current_dir(&opts.dir)?;

    let suites = conf
        .tests
        .into_iter()
        .map(|c| {
            suite::Suite::try_from(c).map(|s| s.with_filters(include.as_ref(), exclude.as_ref()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if opts.dry_run {
        dry_run(&suites);
        return Ok(0);
    }

    let policy = opts.override_policy(conf.run.policy());
    let log_path = conf.report.html.with_extension("log");
    init_logging(&log_path, policy.verbosity.log_level())?;

    let runtime = runtime::Builder::new_multi_thread().enable_all().build()?;
    let interrupt = Interrupt::new();
    interrupt.listen_for_ctrl_c(runtime.handle());

    let factory = suite::ShellFactory::new(suites, runtime.handle().clone(), interrupt.clone());
    let result = Context::new(factory, policy, interrupt).run();

    let mut info = ReportInfo::new(conf.report.title, &result);
    info.tester = conf.report.tester;
    info.version = conf.report.version;
    info.description = conf.report.description;
    info.html_path = conf.report.html;
    info.xml_path = conf.report.xml;
    info.env = conf.env;
    info.nodes = conf.nodes;

    if result.tests_run > 0 {
        report::emit(&info, &result.outcomes)?;
        let subject = conf
            .mail
            .subject
            .clone()
            .unwrap_or_else(|| info.full_title());
        mail::send_report(
            &Smtp::new(&conf.mail),
            &conf.mail.to,
            &subject,
            &info.html_path,
            Some(&log_path),
        );
    } else {
        warn!("No test was run, skipping the reports");
    }

    println!(
        "{}",
        printer::summary_str(&info, &result.outcomes, Some(&log_path))
    );

    Ok(match result.status {
        RunStatus::Passed => 0,
        RunStatus::Failed => 1,
        RunStatus::Canceled => 2,
    })
}

fn main() {
    std::process::exit(match run() {
        Err(err) => {
            println!("error: {}", err);
            1
        }
        Ok(code) => code,
    })
}
