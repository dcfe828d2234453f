//! `cl` — command-line tool for the CL configuration language.
//!
//! Every invocation names a file explicitly rather than disambiguating
//! bare words from filenames, since there's no LSP/publish/codegen
//! subcommand competing for the same argument position.

mod args;
mod error;

use std::io::Read;

use clap::{Parser, Subcommand};

use cl_eval::File;
use error::CliError;

#[derive(Parser)]
#[command(name = "cl", version, about = "Evaluate, format, and inspect CL configuration files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse, build, and call a document with the given args/profiles;
    /// print the resulting value as JSON.
    Eval {
        file: String,

        #[arg(long = "profile")]
        profile: Vec<String>,

        /// Positional and `key=value` named call arguments, after `--`.
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Pretty-print a document's evaluated value back to CL source text.
    Fmt {
        file: String,

        #[arg(short = 'o', long)]
        output: Option<String>,

        #[arg(long = "in-place")]
        in_place: bool,
    },

    /// Evaluate in schema mode and print the derived schema document as
    /// JSON.
    Schema { file: String },

    /// Parse and build only; exit nonzero with rendered diagnostics on
    /// failure.
    Check { file: String },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Eval { file, profile, args } => run_eval(&file, &profile, &args),
        Command::Fmt { file, output, in_place } => run_fmt(&file, output.as_deref(), in_place),
        Command::Schema { file } => run_schema(&file),
        Command::Check { file } => run_check(&file),
    };

    match result {
        Ok(()) => std::process::exit(error::SUCCESS),
        Err(e) => {
            e.render();
            std::process::exit(e.exit_code());
        }
    }
}

fn read_source(path: &str) -> Result<String, CliError> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}

fn parse_file(path: &str, source: &str) -> Result<File, CliError> {
    File::parse(source).map_err(|e| match e {
        cl_eval::LoadError::Parse(errors) => CliError::Parse {
            errors,
            source: source.to_string(),
            filename: path.to_string(),
        },
    })
}

fn write_output(path: &str, text: &str) -> Result<(), CliError> {
    if path == "-" {
        print!("{text}");
    } else {
        std::fs::write(path, text)?;
    }
    Ok(())
}

fn run_eval(file: &str, profiles: &[String], raw_args: &[String]) -> Result<(), CliError> {
    let source = read_source(file)?;
    let doc = parse_file(file, &source)?;

    let mut call_args: Vec<cl_value::CallArgument> = raw_args.iter().map(|a| args::parse_call_argument(a)).collect();
    if let Some(profiles_arg) = args::profiles_argument(profiles) {
        call_args.push(profiles_arg);
    }

    let value = doc.eval(call_args)?;
    let json = cl_ingest::to_json(&value)?;
    println!("{}", serde_json::to_string_pretty(&json).expect("serde_json::Value always serializes"));
    Ok(())
}

fn run_fmt(file: &str, output: Option<&str>, in_place: bool) -> Result<(), CliError> {
    let source = read_source(file)?;
    let doc = parse_file(file, &source)?;
    let value = doc.eval(Vec::new())?;
    let formatted = cl_format::format_value(&value);

    if in_place {
        write_output(file, &formatted)
    } else if let Some(out) = output {
        write_output(out, &formatted)
    } else {
        print!("{formatted}");
        Ok(())
    }
}

fn run_schema(file: &str) -> Result<(), CliError> {
    let source = read_source(file)?;
    let doc = parse_file(file, &source)?;
    let value = doc.schema()?;

    let ctx = cl_value::SchemaContext::new();
    let field_type = cl_value::describe_field_type(&ctx, &value).map_err(|e| cl_eval::EvalError::from_value(e, None))?;
    let json = schema::field_type_to_json(&field_type);
    println!("{}", serde_json::to_string_pretty(&json).expect("serde_json::Value always serializes"));
    Ok(())
}

fn run_check(file: &str) -> Result<(), CliError> {
    let source = read_source(file)?;
    let _doc = parse_file(file, &source)?;
    Ok(())
}

mod schema {
    use cl_value::FieldType;

    pub fn field_type_to_json(ft: &FieldType) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert("kind".into(), serde_json::Value::String(ft.kind.to_string()));

        if let Some(object) = &ft.object {
            let mut fields = serde_json::Map::new();
            for f in &object.fields {
                let mut entry = serde_json::Map::new();
                entry.insert("type".into(), field_type_to_json(&f.field_type));
                entry.insert("optional".into(), serde_json::Value::Bool(f.optional));
                entry.insert("is_match".into(), serde_json::Value::Bool(f.is_match));
                if let Some(desc) = &f.description {
                    entry.insert("description".into(), serde_json::Value::String(desc.clone()));
                }
                fields.insert(f.name.clone(), serde_json::Value::Object(entry));
            }
            map.insert(
                "object".into(),
                serde_json::json!({
                    "path": object.path,
                    "description": object.description,
                    "allow_new_keys": object.allow_new_keys,
                    "reference": object.reference,
                    "fields": fields,
                }),
            );
        }

        if let Some(array) = &ft.array {
            map.insert("array".into(), serde_json::json!({ "items": field_type_to_json(&array.items) }));
        }

        if !ft.constraints.is_empty() {
            let constraints: Vec<serde_json::Value> = ft
                .constraints
                .iter()
                .map(|c| {
                    serde_json::json!({
                        "op": c.op.to_string(),
                        "right": c.right.as_ref().and_then(|v| cl_ingest::to_json(v).ok()),
                    })
                })
                .collect();
            map.insert("constraints".into(), serde_json::Value::Array(constraints));
        }

        if let Some(default) = &ft.default {
            if let Ok(d) = cl_ingest::to_json(default) {
                map.insert("default".into(), d);
            }
        }

        if let Some(alt) = &ft.alternate {
            map.insert("alternate".into(), field_type_to_json(alt));
        }

        serde_json::Value::Object(map)
    }
}
