#![forbid(unsafe_code)]

use anyhow::{Result, anyhow};
use log::{info, LevelFilter};
use std::env;
use lazy_static::lazy_static;
use structopt::StructOpt;

use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;

// Hello Utilities
use crate::utils::errors::Errors;

// ***************************************************************************
//                                Constants
// ***************************************************************************
// Networking.  The PORT environment variable takes precedence over the
// --port command line argument, which takes precedence over the default.
const ENV_HTTP_PORT        : &str = "PORT";
const ENV_HTTP_ADDR        : &str = "BIND_ADDR";
const DEFAULT_HTTP_ADDR    : &str = "0.0.0.0";
const DEFAULT_HTTP_PORT    : u16  = 3000;

// Logging.  When set, this variable names a log4rs yaml configuration file;
// otherwise a console appender is installed programmatically.
const ENV_LOG4RS_CONFIG    : &str = "HELLO_SERVER_LOG4RS_CONFIG";
const LOG_PATTERN          : &str = "{d(%Y-%m-%d %H:%M:%S)} {h({l})} {t} - {m}{n}";

// ***************************************************************************
//                             Static Variables
// ***************************************************************************
// Assign the command line arguments BEFORE RUNTIME_CTX is initialized in main.
lazy_static! {
    pub static ref HELLO_ARGS: HelloArgs = init_hello_args();
}

// ***************************************************************************
//                               Config Structs
// ***************************************************************************
// ---------------------------------------------------------------------------
// CommandLineArgs:
// ---------------------------------------------------------------------------
#[derive(Debug, StructOpt)]
#[structopt(name = "hello_args", about = "Command line arguments for hello_server.")]
pub struct HelloArgs {
    /// Specify the TCP port to bind.
    ///
    /// The PORT environment variable, when set, overrides this argument.
    #[structopt(short, long)]
    pub port: Option<u16>,
}

// ---------------------------------------------------------------------------
// Parms:
// ---------------------------------------------------------------------------
#[derive(Debug)]
pub struct Parms {
    pub config: Config,
}

// ---------------------------------------------------------------------------
// RuntimeCtx:
// ---------------------------------------------------------------------------
#[derive(Debug)]
#[allow(dead_code)]
pub struct RuntimeCtx {
    pub parms: Parms,
    pub hello_args: &'static HelloArgs,
}

// ---------------------------------------------------------------------------
// Config:
// ---------------------------------------------------------------------------
#[derive(Debug)]
pub struct Config {
    pub http_addr: String,
    pub http_port: u16,
}

impl Config {
    #[allow(dead_code)]
    pub fn new() -> Self {
        Config::default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            http_port: DEFAULT_HTTP_PORT,
        }
    }
}

// ***************************************************************************
//                            Argument Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// init_hello_args:
// ---------------------------------------------------------------------------
/** Get the command line arguments. */
fn init_hello_args() -> HelloArgs {
    let args = HelloArgs::from_args();
    println!("{:?}", args);
    args
}

// ***************************************************************************
//                               Log Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// init_log:
// ---------------------------------------------------------------------------
pub fn init_log() {
    // Initialize log4rs logging from a yaml file if one is named in the
    // environment, otherwise fall back to a console appender.
    match env::var(ENV_LOG4RS_CONFIG) {
        Ok(logconfig) => {
            match log4rs::init_file(logconfig.clone(), Default::default()) {
                Ok(_) => (),
                Err(e) => {
                    println!("{}", e);
                    let s = format!("{}", Errors::Log4rsInitialization(logconfig));
                    panic!("{}", s);
                },
            }
            info!("Log4rs initialized using: {}", logconfig);
        },
        Err(_) => {
            init_log_console();
            info!("Log4rs initialized with console defaults.");
        },
    }
}

// ---------------------------------------------------------------------------
// init_log_console:
// ---------------------------------------------------------------------------
/** Install a console appender at INFO level.  Used whenever no log4rs
 * configuration file is supplied through the environment.
 */
fn init_log_console() {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build();
    let logconfig = match log4rs::Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info)) {
            Ok(c) => c,
            Err(e) => {
                let s = format!("{}", Errors::Log4rsInitialization(e.to_string()));
                panic!("{}", s);
            },
        };
    match log4rs::init_config(logconfig) {
        Ok(_) => (),
        Err(e) => {
            let s = format!("{}", Errors::Log4rsInitialization(e.to_string()));
            panic!("{}", s);
        },
    }
}

/// ***************************************************************************
//                             Parms Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// get_parms:
// ---------------------------------------------------------------------------
/** Retrieve the application parameters from the environment and the command
 * line.  The listening port is resolved in this priority order:
 *
 *   1. If set, the value of the PORT environment variable,
 *
 *   2. Otherwise, if given, the value of the --port command line argument,
 *
 *   3. Otherwise, 3000.
 *
 * An unparsable PORT value is an error that aborts start up.
 */
fn get_parms() -> Result<Parms> {
    let http_port = resolve_port(env::var(ENV_HTTP_PORT).ok().as_deref(), HELLO_ARGS.port)?;
    let http_addr = env::var(ENV_HTTP_ADDR)
        .unwrap_or_else(|_| DEFAULT_HTTP_ADDR.to_string());
    Ok(Parms { config: Config { http_addr, http_port } })
}

// ---------------------------------------------------------------------------
// resolve_port:
// ---------------------------------------------------------------------------
/** Resolve the listening port from an optional environment value and an
 * optional command line value.  The u16 parse enforces the 0-65535 range.
 */
fn resolve_port(env_port: Option<&str>, arg_port: Option<u16>) -> Result<u16> {
    match env_port {
        Some(s) => s.trim().parse::<u16>()
            .map_err(|e| anyhow!("{}", Errors::InvalidPort(s.to_string(), e.to_string()))),
        None => Ok(arg_port.unwrap_or(DEFAULT_HTTP_PORT)),
    }
}

// ***************************************************************************
//                             Config Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// init_runtime_context:
// ---------------------------------------------------------------------------
pub fn init_runtime_context() -> RuntimeCtx {
    // If this fails the application aborts.
    let parms = get_parms().expect("FAILED to resolve configuration.");
    RuntimeCtx {parms, hello_args: &HELLO_ARGS}
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use crate::utils::config::{resolve_port, Config, DEFAULT_HTTP_PORT};

    #[test]
    fn print_config() {
        println!("{:?}", Config::new());
    }

    #[test]
    fn port_defaults_when_unset() {
        assert_eq!(resolve_port(None, None).unwrap(), DEFAULT_HTTP_PORT);
    }

    #[test]
    fn port_from_environment() {
        assert_eq!(resolve_port(Some("8080"), None).unwrap(), 8080);
    }

    #[test]
    fn environment_overrides_argument() {
        assert_eq!(resolve_port(Some("8080"), Some(9090)).unwrap(), 8080);
    }

    #[test]
    fn port_from_argument_when_env_unset() {
        assert_eq!(resolve_port(None, Some(9090)).unwrap(), 9090);
    }

    #[test]
    fn port_range_boundaries() {
        assert_eq!(resolve_port(Some("0"), None).unwrap(), 0);
        assert_eq!(resolve_port(Some("65535"), None).unwrap(), 65535);
    }

    #[test]
    fn invalid_port_values_rejected() {
        assert!(resolve_port(Some("not-a-port"), None).is_err());
        assert!(resolve_port(Some("65536"), None).is_err());
        assert!(resolve_port(Some("-1"), None).is_err());
        assert!(resolve_port(Some(""), None).is_err());
    }
}
