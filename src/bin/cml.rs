use anyhow::{bail, Context, Result};
use molecule_cml::*;
use std::io::Write;
use tracing::*;

const USAGE: &str = "usage: cml [--cjson] [--keep-hs] [--no-sanitize] [--strict] [--log LEVEL] INPUT [OUTPUT]";

#[derive(Debug, Default)]
struct Options {
    cjson: bool,
    parser: CmlParserParams,
    writer: CmlWriterParams,
    log_level: Option<String>,
    input: Option<String>,
    output: Option<String>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Options> {
    let mut options = Options::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--cjson" => options.cjson = true,
            "--keep-hs" => options.parser.remove_hs = false,
            "--no-sanitize" => options.parser.sanitize = false,
            "--strict" => options.writer.strict_bond_orders = true,
            "--log" => options.log_level = Some(args.next().context("--log needs a level")?),
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            flag if flag.starts_with("--") => bail!("unknown option {flag}\n{USAGE}"),
            _ if options.input.is_none() => options.input = Some(arg.clone()),
            _ if options.output.is_none() => options.output = Some(arg.clone()),
            _ => bail!("too many arguments\n{USAGE}"),
        }
    }
    Ok(options)
}

fn main() -> Result<()> {
    let options = parse_args(std::env::args().skip(1))?;
    init_logging(options.log_level.as_deref().unwrap_or("warn"));

    let input = options.input.as_deref().context(USAGE)?;
    let Some(mol) = mol_from_cml_file(input, options.parser)
        .with_context(|| format!("Failed to read {input}"))?
    else {
        bail!("{input} does not contain a molecule");
    };
    info!("read {} atoms and {} bonds from {input}", mol.num_atoms(), mol.num_bonds());

    match (&options.output, options.cjson) {
        (Some(path), true) => mol_to_cjson_file(&mol, path, CjsonWriterParams::default(), None)?,
        (Some(path), false) => {
            let mut writer = CmlWriter::create(path, options.writer)?;
            writer.add(&mol, None)?;
            writer.write()?;
        }
        (None, true) => print!("{}", mol_to_cjson_block(&mol, CjsonWriterParams::default(), None)?),
        (None, false) => {
            let block = mol_to_cml_block(&mol, options.writer, None)?;
            std::io::stdout().write_all(block.as_bytes())?;
        }
    }
    Ok(())
}
