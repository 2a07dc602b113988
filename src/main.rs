//! # Chaser-Harness 命令行入口
//!
//! 连接到已有的 WebDriver（Selenium / Appium）会话或 Chrome DevTools 端点，
//! 执行一次带同步等待的等待或操作，并以退出码报告结果。
//!
//! ## 环境变量
//! - `HARNESS_WEBDRIVER_URL`: WebDriver 端点（默认: http://localhost:4444）
//! - `HARNESS_SESSION_ID`: 要附加的 WebDriver 会话 ID
//! - `HARNESS_SURFACE`: `web` 或 `mobile`
//! - `HARNESS_WEB_TIMEOUT` / `HARNESS_MOBILE_TIMEOUT` / `HARNESS_POLL_INTERVAL`
//! - `RUST_LOG`: 日志过滤器，覆盖配置中的 `log_level`

use anyhow::{anyhow, bail, Context};
use chaser_harness::{
    cdp::CdpBrowser,
    driver::DriverSession,
    report::TracingSink,
    webdriver::WebDriverSession,
    ActionExecutor, Condition, Config, ElementHandle, Locator, Outcome, OutcomeReporter,
    Surface, TestMetadata,
};
use clap::{Parser, Subcommand};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "chaser-harness", version, about = "Synchronized waits and actions against a live UI session")]
struct Args {
    /// TOML configuration file; environment variables apply when omitted
    #[arg(long, short)]
    config: Option<String>,

    /// WebDriver endpoint
    #[arg(long, env = "HARNESS_WEBDRIVER_URL")]
    webdriver_url: Option<String>,

    /// WebDriver session to attach to
    #[arg(long, env = "HARNESS_SESSION_ID")]
    session_id: Option<String>,

    /// Surface under test (web or mobile)
    #[arg(long)]
    surface: Option<Surface>,

    /// Chrome DevTools HTTP endpoint; used instead of WebDriver when set
    #[arg(long)]
    cdp: Option<String>,

    /// Attach to the first page whose URL contains this text
    #[arg(long, requires = "cdp")]
    page: Option<String>,

    /// Wait budget in milliseconds; the surface default applies when omitted
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Poll interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Wait until a condition holds
    Wait {
        /// Element locator, `strategy=value`
        #[arg(long, short)]
        locator: Option<String>,

        /// displayed, hidden, exists, enabled, clickable, text=X, text!=X,
        /// text~=X, attr:NAME=VALUE, url~=X or script=JS
        #[arg(long, short = 'C', default_value = "displayed")]
        condition: ConditionArg,
    },
    /// Click once the element is clickable
    Click {
        #[arg(long, short)]
        locator: String,
    },
    /// Tap once the element is clickable
    Tap {
        #[arg(long, short)]
        locator: String,
    },
    /// Replace the element's value with text
    Type {
        #[arg(long, short)]
        locator: String,

        #[arg(long, short)]
        text: String,
    },
    /// Clear the element's value
    Clear {
        #[arg(long, short)]
        locator: String,
    },
}

/// Condition named on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
enum ConditionArg {
    Displayed,
    Hidden,
    Exists,
    Enabled,
    Clickable,
    TextEquals(String),
    TextNotEquals(String),
    TextContains(String),
    AttributeEquals { name: String, value: String },
    UrlContains(String),
    Script(String),
}

impl FromStr for ConditionArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        // Longest prefixes first
        if let Some(rest) = s.strip_prefix("text!=") {
            return Ok(ConditionArg::TextNotEquals(rest.to_string()));
        }
        if let Some(rest) = s.strip_prefix("text~=") {
            return Ok(ConditionArg::TextContains(rest.to_string()));
        }
        if let Some(rest) = s.strip_prefix("text=") {
            return Ok(ConditionArg::TextEquals(rest.to_string()));
        }
        if let Some(rest) = s.strip_prefix("url~=") {
            return Ok(ConditionArg::UrlContains(rest.to_string()));
        }
        if let Some(rest) = s.strip_prefix("script=") {
            return Ok(ConditionArg::Script(rest.to_string()));
        }
        if let Some(rest) = s.strip_prefix("attr:") {
            let (name, value) = rest
                .split_once('=')
                .ok_or_else(|| format!("expected attr:NAME=VALUE, got '{}'", s))?;
            if name.is_empty() {
                return Err(format!("missing attribute name in '{}'", s));
            }
            return Ok(ConditionArg::AttributeEquals {
                name: name.to_string(),
                value: value.to_string(),
            });
        }

        match s.to_ascii_lowercase().as_str() {
            "displayed" | "visible" => Ok(ConditionArg::Displayed),
            "hidden" | "not-displayed" => Ok(ConditionArg::Hidden),
            "exists" | "present" => Ok(ConditionArg::Exists),
            "enabled" => Ok(ConditionArg::Enabled),
            "clickable" => Ok(ConditionArg::Clickable),
            _ => Err(format!("unknown condition '{}'", s)),
        }
    }
}

impl ConditionArg {
    fn needs_element(&self) -> bool {
        !matches!(self, ConditionArg::UrlContains(_) | ConditionArg::Script(_))
    }

    fn build(self, session: Arc<dyn DriverSession>, element: Option<Arc<ElementHandle>>) -> anyhow::Result<Condition> {
        let element = || {
            element
                .clone()
                .ok_or_else(|| anyhow!("--locator is required for this condition"))
        };
        Ok(match self {
            ConditionArg::UrlContains(substring) => Condition::url_contains(session, substring),
            ConditionArg::Script(script) => Condition::script_returns_true(session, script),
            ConditionArg::Displayed => Condition::displayed(element()?),
            ConditionArg::Hidden => Condition::not_displayed(element()?),
            ConditionArg::Exists => Condition::exists(element()?),
            ConditionArg::Enabled => Condition::enabled(element()?),
            ConditionArg::Clickable => Condition::clickable(element()?),
            ConditionArg::TextEquals(text) => Condition::text_equals(element()?, text),
            ConditionArg::TextNotEquals(text) => Condition::text_not_equals(element()?, text),
            ConditionArg::TextContains(text) => Condition::text_contains(element()?, text),
            ConditionArg::AttributeEquals { name, value } => {
                Condition::attribute_equals(element()?, name, value)
            }
        })
    }
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path).with_context(|| format!("loading {}", path))?,
        None => Config::from_env().context("reading HARNESS_* environment")?,
    };

    if let Some(url) = &args.webdriver_url {
        config.webdriver_url = url.clone();
    }
    if let Some(session_id) = &args.session_id {
        config.session_id = Some(session_id.clone());
    }
    if let Some(surface) = args.surface {
        config.surface = surface;
    }
    if let Some(interval) = args.interval_ms {
        config.poll_interval_ms = interval;
    }
    config.validate()?;
    Ok(config)
}

async fn connect(args: &Args, config: &Config) -> anyhow::Result<Arc<dyn DriverSession>> {
    if let Some(endpoint) = &args.cdp {
        if config.surface == Surface::Mobile {
            bail!("the DevTools driver only serves web surfaces");
        }
        let browser = CdpBrowser::new(endpoint.clone(), config.call_timeout());
        let session = browser.attach(args.page.as_deref()).await?;
        return Ok(Arc::new(session));
    }
    Ok(Arc::new(WebDriverSession::attach(config)?))
}

async fn run(args: Args, config: Config) -> anyhow::Result<Outcome> {
    let session = connect(&args, &config).await?;
    let surface = session.surface();

    let mut executor = ActionExecutor::from_config(&config);
    if let Some(timeout) = args.timeout_ms {
        executor = executor.with_timeout(Duration::from_millis(timeout));
    }
    info!(
        "Using a {}ms budget on the {} surface (poll every {}ms)",
        executor.budget(surface).as_millis(),
        surface,
        executor.poller().interval().as_millis()
    );

    let handle = |locator: &str| -> anyhow::Result<Arc<ElementHandle>> {
        let locator = Locator::parse(locator, surface)?;
        Ok(Arc::new(ElementHandle::from_locator(
            session.clone(),
            locator.clone(),
            locator.to_string(),
        )))
    };

    let outcome = match args.command {
        Command::Wait { locator, condition } => {
            let element = match &locator {
                Some(locator) => Some(handle(locator)?),
                None if condition.needs_element() => bail!("--locator is required for {:?}", condition),
                None => None,
            };
            executor.wait(condition.build(session.clone(), element)?).await
        }
        Command::Click { locator } => executor.click(&handle(&locator)?).await,
        Command::Tap { locator } => executor.tap(&handle(&locator)?).await,
        Command::Type { locator, text } => executor.clear_and_type(&handle(&locator)?, &text).await,
        Command::Clear { locator } => executor.clear(&handle(&locator)?).await,
    };
    Ok(outcome)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    info!("Chaser-Harness v{}", chaser_harness::VERSION);

    let reporter = OutcomeReporter::new(Arc::new(TracingSink))
        .with_metadata(TestMetadata::new("cli").with_field("surface", config.surface.as_str()));

    let outcome = tokio::select! {
        outcome = run(args, config) => outcome?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted before the wait completed");
            std::process::exit(130);
        }
    };

    if reporter.report(&outcome) {
        println!(
            "ok: {} ({}ms, {} polls)",
            outcome.context().condition,
            outcome.context().elapsed.as_millis(),
            outcome.context().ticks
        );
        Ok(())
    } else {
        std::process::exit(match outcome {
            Outcome::Timeout { .. } => 2,
            _ => 1,
        });
    }
}
