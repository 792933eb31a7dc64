use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::LevelFilter;

use classmap_rewriter::{archive, properties, MappingBuilder, MappingTable};

mod cli;

use cli::Opt;

fn main() -> Result<()> {
    let opt = Opt::parse();

    env_logger::builder()
        .format_timestamp(None)
        .format_target(false)
        .filter_level(if opt.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .parse_env(env_logger::Env::default())
        .init();

    if opt.output.is_some() && opt.inputs.len() > 1 {
        bail!("--output can only be used with a single input; rewrite each file separately or omit it to rewrite in place");
    }

    let mapping = build_mapping(&opt)?;

    for input in &opt.inputs {
        rewrite_one(input, opt.output.as_deref(), opt.force, &mapping)?;
    }

    Ok(())
}

fn build_mapping(opt: &Opt) -> Result<MappingTable> {
    let mut builder = MappingBuilder::new();

    if let Some(path) = &opt.mapping_file {
        let file = File::open(path)
            .with_context(|| format!("reading mapping file {}", path.display()))?;
        for (from, to) in properties::parse(BufReader::new(file))? {
            builder
                .add(&from, &to)
                .with_context(|| format!("loading mapping file {}", path.display()))?;
        }
    }

    for pair in &opt.map {
        let (from, to) = pair.split_once('=').with_context(|| {
            format!("`--map {pair}` is not in `FROM=TO` form")
        })?;
        builder.add(from, to).context("adding --map entry")?;
    }

    builder
        .build()
        .context("no mapping entries given (use --map or --mapping-file)")
}

fn rewrite_one(
    input_path: &Path,
    output: Option<&Path>,
    force: bool,
    mapping: &MappingTable,
) -> Result<()> {
    let is_archive = input_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("jar") || ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false);

    let in_place = output.is_none();
    let work_path = output
        .map(PathBuf::from)
        .unwrap_or_else(|| input_path.with_extension("rewrite.tmp"));

    if is_archive {
        let input = File::open(input_path)
            .with_context(|| format!("opening archive {}", input_path.display()))?;
        let out_file = File::create(&work_path)
            .with_context(|| format!("creating {}", work_path.display()))?;
        let rewritten = archive::rewrite_archive(input, out_file, mapping)
            .with_context(|| format!("rewriting archive {}", input_path.display()))?;
        log::info!(
            "{}: rewrote {} of its class members",
            input_path.display(),
            rewritten
        );
    } else {
        let mut bytes = Vec::new();
        File::open(input_path)
            .with_context(|| format!("opening {}", input_path.display()))?
            .read_to_end(&mut bytes)
            .with_context(|| format!("reading {}", input_path.display()))?;

        match classmap_rewriter::transform(&bytes, mapping)
            .with_context(|| format!("rewriting {}", input_path.display()))?
        {
            std::borrow::Cow::Borrowed(_) => {
                log::debug!("{}: no matches, left unchanged", input_path.display());
                if !in_place {
                    std::fs::copy(input_path, &work_path).with_context(|| {
                        format!("copying unchanged {}", input_path.display())
                    })?;
                } else {
                    return Ok(());
                }
            }
            std::borrow::Cow::Owned(patched) => {
                log::info!("{}: rewrote string-table entries", input_path.display());
                let mut out = File::create(&work_path)
                    .with_context(|| format!("creating {}", work_path.display()))?;
                out.write_all(&patched)
                    .with_context(|| format!("writing {}", work_path.display()))?;
            }
        }
    }

    finish_output(input_path, &work_path, in_place, force)
}

/// Archives and single class files share the same "write to a work path, then either
/// leave it in place or swap it back over the original" finishing step.
fn finish_output(input_path: &Path, work_path: &Path, in_place: bool, force: bool) -> Result<()> {
    if !in_place {
        return Ok(());
    }
    if !force {
        let ext = input_path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let backup = input_path.with_extension(format!("{ext}.bak"));
        std::fs::copy(input_path, backup).context("creating backup")?;
    }
    std::fs::rename(work_path, input_path)
        .context("moving the rewritten file in place of the original")?;
    Ok(())
}
