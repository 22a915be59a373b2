//! Token-driven command parser.
//!
//! Commands arrive as already-tokenized argument vectors from the host
//! protocol layer. Tokens are raw bytes: positions that carry names,
//! keywords or literals must be UTF-8; blob positions are taken verbatim.
//! Command names and keywords are case-insensitive; keys, tags, and
//! literals are not.
//!
//! Arity failures report the canonical command name. Semantic failures
//! (unknown dtype, bad shape, unparsable literal) carry their own messages
//! and take precedence only once arity is satisfied.

use tensordb_core::{Backend, DType, Device, Error, Result, Scalar, Tensor};

/// A parsed command, ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `AI.TENSORSET key dtype dim... [VALUES v... | BLOB bytes]`
    TensorSet {
        /// Target key.
        key: String,
        /// The fully validated tensor; omitted payloads zero-fill.
        tensor: Tensor,
    },
    /// `AI.TENSORGET key (META|VALUES|BLOB)`
    TensorGet {
        /// Source key.
        key: String,
        /// Requested reply shape.
        format: TensorFormat,
    },
    /// `AI.MODELSET key backend device [TAG tag] [INPUTS n... OUTPUTS n...] blob`
    ModelSet {
        /// Target key.
        key: String,
        /// Backend tag.
        backend: Backend,
        /// Execution target.
        device: Device,
        /// Opaque user tag, empty when unset.
        tag: String,
        /// Declared input names (graph backend only).
        inputs: Vec<String>,
        /// Declared output names (graph backend only).
        outputs: Vec<String>,
        /// The model blob, verbatim.
        blob: Vec<u8>,
    },
    /// `AI.MODELGET key`
    ModelGet {
        /// Source key.
        key: String,
    },
    /// `AI.MODELDEL key`
    ModelDel {
        /// Target key.
        key: String,
    },
    /// `AI.MODELRUN key INPUTS k... OUTPUTS k...`
    ModelRun {
        /// Model key.
        key: String,
        /// Input tensor keys in binding order.
        inputs: Vec<String>,
        /// Output tensor keys in production order.
        outputs: Vec<String>,
    },
    /// `AI.SCRIPTSET key device [TAG tag] source`
    ScriptSet {
        /// Target key.
        key: String,
        /// Execution target.
        device: Device,
        /// Opaque user tag, empty when unset.
        tag: String,
        /// Script source text.
        source: String,
    },
    /// `AI.SCRIPTGET key`
    ScriptGet {
        /// Source key.
        key: String,
    },
    /// `AI.SCRIPTDEL key`
    ScriptDel {
        /// Target key.
        key: String,
    },
    /// `AI.SCRIPTRUN key entry INPUTS k... OUTPUTS k...`
    ScriptRun {
        /// Script key.
        key: String,
        /// Entry point name.
        entry: String,
        /// Input tensor keys in binding order.
        inputs: Vec<String>,
        /// Output tensor keys.
        outputs: Vec<String>,
    },
    /// `AI.INFO key [RESETSTAT]`
    Info {
        /// Model or script key.
        key: String,
        /// Whether to zero the counters instead of reading them.
        reset: bool,
    },
}

/// Reply shape requested by TENSORGET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorFormat {
    /// dtype and shape only.
    Meta,
    /// Decoded literals.
    Values,
    /// The raw buffer.
    Blob,
}

/// Parse one tokenized command.
pub fn parse(args: &[Vec<u8>]) -> Result<Command> {
    let name = args
        .first()
        .ok_or_else(|| Error::InvalidArgument("empty command".into()))?;
    let name = text_token(name)?;
    match name.to_ascii_uppercase().as_str() {
        "AI.TENSORSET" => parse_tensor_set(args),
        "AI.TENSORGET" => parse_tensor_get(args),
        "AI.MODELSET" => parse_model_set(args),
        "AI.MODELGET" => parse_single_key(args, "AI.MODELGET", |key| Command::ModelGet { key }),
        "AI.MODELDEL" => parse_single_key(args, "AI.MODELDEL", |key| Command::ModelDel { key }),
        "AI.MODELRUN" => parse_model_run(args),
        "AI.SCRIPTSET" => parse_script_set(args),
        "AI.SCRIPTGET" => parse_single_key(args, "AI.SCRIPTGET", |key| Command::ScriptGet { key }),
        "AI.SCRIPTDEL" => parse_single_key(args, "AI.SCRIPTDEL", |key| Command::ScriptDel { key }),
        "AI.SCRIPTRUN" => parse_script_run(args),
        "AI.INFO" => parse_info(args),
        _ => Err(Error::InvalidArgument(format!("unknown command: {}", name))),
    }
}

// ===== Token helpers =====

fn text_token(token: &[u8]) -> Result<&str> {
    std::str::from_utf8(token)
        .map_err(|_| Error::InvalidArgument("argument is not valid text".into()))
}

fn is_keyword(token: &[u8], keyword: &str) -> bool {
    text_token(token)
        .map(|t| t.eq_ignore_ascii_case(keyword))
        .unwrap_or(false)
}

// ===== Per-command grammars =====

fn parse_single_key<F>(args: &[Vec<u8>], name: &'static str, build: F) -> Result<Command>
where
    F: FnOnce(String) -> Command,
{
    if args.len() != 2 {
        return Err(Error::WrongArity(name));
    }
    Ok(build(text_token(&args[1])?.to_string()))
}

fn parse_tensor_set(args: &[Vec<u8>]) -> Result<Command> {
    if args.len() < 4 {
        return Err(Error::WrongArity("AI.TENSORSET"));
    }
    let key = text_token(&args[1])?.to_string();
    let dtype = DType::parse_token(text_token(&args[2])?)?;

    let mut pos = 3;
    let mut shape = Vec::new();
    while pos < args.len() {
        if is_keyword(&args[pos], "VALUES") || is_keyword(&args[pos], "BLOB") {
            break;
        }
        let dim: usize = text_token(&args[pos])?.parse().map_err(|_| {
            Error::InvalidArgument("invalid argument found in tensor shape".into())
        })?;
        shape.push(dim);
        pos += 1;
    }
    tensordb_core::tensor::check_shape(&shape)?;
    let element_count = tensordb_core::tensor::element_count(&shape)?;
    let byte_len = tensordb_core::tensor::byte_size(dtype, &shape)?;

    let tensor = if pos == args.len() {
        // No payload zero-fills the buffer.
        Tensor::from_blob(dtype, shape, vec![0u8; byte_len])?
    } else if is_keyword(&args[pos], "VALUES") {
        let literals = &args[pos + 1..];
        if literals.len() != element_count {
            return Err(Error::WrongArity("AI.TENSORSET"));
        }
        let scalars: Vec<Scalar> = literals
            .iter()
            .map(|lit| dtype.parse_literal(text_token(lit)?))
            .collect::<Result<_>>()?;
        Tensor::from_scalars(dtype, shape, &scalars)?
    } else {
        if args.len() != pos + 2 {
            return Err(Error::WrongArity("AI.TENSORSET"));
        }
        Tensor::from_blob(dtype, shape, args[pos + 1].clone())?
    };
    Ok(Command::TensorSet { key, tensor })
}

fn parse_tensor_get(args: &[Vec<u8>]) -> Result<Command> {
    if args.len() != 3 {
        return Err(Error::WrongArity("AI.TENSORGET"));
    }
    let key = text_token(&args[1])?.to_string();
    let mode = text_token(&args[2])?;
    let format = match mode.to_ascii_uppercase().as_str() {
        "META" => TensorFormat::Meta,
        "VALUES" => TensorFormat::Values,
        "BLOB" => TensorFormat::Blob,
        _ => return Err(Error::InvalidArgument("unsupported data format".into())),
    };
    Ok(Command::TensorGet { key, format })
}

fn parse_model_set(args: &[Vec<u8>]) -> Result<Command> {
    if args.len() < 5 {
        return Err(Error::WrongArity("AI.MODELSET"));
    }
    let key = text_token(&args[1])?.to_string();
    let backend = Backend::parse_token(text_token(&args[2])?)?;
    let device = Device::parse_token(text_token(&args[3])?)?;

    let mut pos = 4;
    let mut tag = String::new();
    if is_keyword(&args[pos], "TAG") {
        if pos + 1 >= args.len() {
            return Err(Error::WrongArity("AI.MODELSET"));
        }
        tag = text_token(&args[pos + 1])?.to_string();
        pos += 2;
    }

    let mut inputs = Vec::new();
    let mut outputs = Vec::new();
    if pos < args.len() && is_keyword(&args[pos], "INPUTS") {
        pos += 1;
        while pos < args.len() - 1 && !is_keyword(&args[pos], "OUTPUTS") {
            inputs.push(text_token(&args[pos])?.to_string());
            pos += 1;
        }
        if pos >= args.len() - 1 || !is_keyword(&args[pos], "OUTPUTS") {
            return Err(Error::InvalidArgument("OUTPUTS not specified".into()));
        }
        pos += 1;
        // The final argument is always the blob.
        while pos < args.len() - 1 {
            outputs.push(text_token(&args[pos])?.to_string());
            pos += 1;
        }
    }
    if pos != args.len() - 1 {
        return Err(Error::WrongArity("AI.MODELSET"));
    }
    Ok(Command::ModelSet {
        key,
        backend,
        device,
        tag,
        inputs,
        outputs,
        blob: args[pos].clone(),
    })
}

fn parse_key_lists(args: &[Vec<u8>], start: usize) -> Result<(Vec<String>, Vec<String>)> {
    let mut pos = start;
    if pos >= args.len() || !is_keyword(&args[pos], "INPUTS") {
        return Err(Error::InvalidArgument("INPUTS not specified".into()));
    }
    pos += 1;
    let mut inputs = Vec::new();
    while pos < args.len() && !is_keyword(&args[pos], "OUTPUTS") {
        inputs.push(text_token(&args[pos])?.to_string());
        pos += 1;
    }
    if pos >= args.len() {
        return Err(Error::InvalidArgument("OUTPUTS not specified".into()));
    }
    pos += 1;
    let mut outputs = Vec::new();
    while pos < args.len() {
        outputs.push(text_token(&args[pos])?.to_string());
        pos += 1;
    }
    Ok((inputs, outputs))
}

fn parse_model_run(args: &[Vec<u8>]) -> Result<Command> {
    if args.len() < 2 {
        return Err(Error::WrongArity("AI.MODELRUN"));
    }
    let key = text_token(&args[1])?.to_string();
    let (inputs, outputs) = parse_key_lists(args, 2)?;
    Ok(Command::ModelRun {
        key,
        inputs,
        outputs,
    })
}

fn parse_script_set(args: &[Vec<u8>]) -> Result<Command> {
    if args.len() < 4 {
        return Err(Error::WrongArity("AI.SCRIPTSET"));
    }
    let key = text_token(&args[1])?.to_string();
    let device = Device::parse_token(text_token(&args[2])?)?;
    let mut pos = 3;
    let mut tag = String::new();
    if is_keyword(&args[pos], "TAG") {
        if pos + 1 >= args.len() {
            return Err(Error::WrongArity("AI.SCRIPTSET"));
        }
        tag = text_token(&args[pos + 1])?.to_string();
        pos += 2;
    }
    if pos != args.len() - 1 {
        return Err(Error::WrongArity("AI.SCRIPTSET"));
    }
    Ok(Command::ScriptSet {
        key,
        device,
        tag,
        source: text_token(&args[pos])?.to_string(),
    })
}

fn parse_script_run(args: &[Vec<u8>]) -> Result<Command> {
    if args.len() < 3 {
        return Err(Error::WrongArity("AI.SCRIPTRUN"));
    }
    let key = text_token(&args[1])?.to_string();
    let entry = text_token(&args[2])?.to_string();
    let (inputs, outputs) = parse_key_lists(args, 3)?;
    Ok(Command::ScriptRun {
        key,
        entry,
        inputs,
        outputs,
    })
}

fn parse_info(args: &[Vec<u8>]) -> Result<Command> {
    match args.len() {
        2 => Ok(Command::Info {
            key: text_token(&args[1])?.to_string(),
            reset: false,
        }),
        3 if is_keyword(&args[2], "RESETSTAT") => Ok(Command::Info {
            key: text_token(&args[1])?.to_string(),
            reset: true,
        }),
        _ => Err(Error::WrongArity("AI.INFO")),
    }
}
