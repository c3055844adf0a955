//! CLI surface: flags and exit codes, defined with `clap`'s derive
//! style.

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "mcee", about = "Multi-stage affective-state pipeline runtime")]
pub struct Args {
    /// Path to a flat key=value config file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Message bus host override.
    #[arg(long, value_name = "H")]
    pub host: Option<String>,

    /// Message bus port override.
    #[arg(long, value_name = "P")]
    pub port: Option<u16>,

    /// Message bus username override.
    #[arg(long, value_name = "U")]
    pub user: Option<String>,

    /// Message bus password override.
    #[arg(long, value_name = "P")]
    pub pass: Option<String>,

    /// Run the built-in emotion-scenario demo instead of consuming the bus.
    #[arg(long)]
    pub demo: bool,

    /// Exercise the LLM-adjacent path and exit (kept for wire
    /// compatibility with the original CLI surface; the core has no LLM
    /// dependency, so this is a no-op smoke test here).
    #[arg(long = "llm-test")]
    pub llm_test: bool,
}

pub const EXIT_OK: i32 = 0;
pub const EXIT_FATAL: i32 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_config_and_demo_flags() {
        let args = Args::parse_from(["mcee", "--config", "mcee.conf", "--demo"]);
        assert_eq!(args.config.as_deref(), Some("mcee.conf"));
        assert!(args.demo);
        assert!(!args.llm_test);
    }

    #[test]
    fn parses_bus_overrides() {
        let args = Args::parse_from([
                "mcee", "--host", "broker.local", "--port", "5673", "--user", "svc", "--pass", "hunter2",
        ]);
        assert_eq!(args.host.as_deref(), Some("broker.local"));
        assert_eq!(args.port, Some(5673));
        assert_eq!(args.user.as_deref(), Some("svc"));
        assert_eq!(args.pass.as_deref(), Some("hunter2"));
    }
}
