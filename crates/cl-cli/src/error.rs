//! CLI error taxonomy and exit codes (spec §6.5), expressed as a
//! `thiserror` enum to match this workspace's error-handling convention.

const EXIT_SUCCESS: i32 = 0;
const EXIT_SYNTAX_ERROR: i32 = 1;
const EXIT_EVAL_ERROR: i32 = 2;
const EXIT_IO_ERROR: i32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{} syntax error(s) in {filename}", errors.len())]
    Parse {
        errors: Vec<cl_parser::ParseError>,
        source: String,
        filename: String,
    },

    #[error(transparent)]
    Eval(#[from] cl_eval::EvalError),

    #[error(transparent)]
    Ingest(#[from] cl_ingest::IngestError),

    #[error("{0}")]
    Usage(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Io(_) => EXIT_IO_ERROR,
            CliError::Parse { .. } => EXIT_SYNTAX_ERROR,
            CliError::Eval(_) => EXIT_EVAL_ERROR,
            CliError::Ingest(_) => EXIT_EVAL_ERROR,
            CliError::Usage(_) => EXIT_SYNTAX_ERROR,
        }
    }

    /// Render this error for stderr: parse errors get a full ariadne
    /// report per offending span, everything else is one `Display` line.
    pub fn render(&self) {
        match self {
            CliError::Parse { errors, source, filename } => {
                for e in errors {
                    eprint!("{}", e.render(filename, source));
                }
            }
            other => eprintln!("error: {other}"),
        }
    }
}

pub const SUCCESS: i32 = EXIT_SUCCESS;
