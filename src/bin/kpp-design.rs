use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use kira_primer_pairs::*;
use needletail::parse_fastx_file;
use rayon::ThreadPoolBuilder;

/// Design PCR primer pairs shared by the sequences of a FASTA corpus.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Input FASTA/FASTQ(.gz) path
    #[arg(short, long)]
    input: PathBuf,

    /// Minimum primer length
    #[arg(long, default_value_t = 16)]
    min_len: usize,

    /// Maximum primer length (span <= 16)
    #[arg(long, default_value_t = 25)]
    max_len: usize,

    /// Minimum distance between forward end and reverse start
    #[arg(long, default_value_t = 60)]
    min_amplicon: usize,

    /// Maximum distance between forward end and reverse start
    #[arg(long, default_value_t = 150)]
    max_amplicon: usize,

    #[arg(long, default_value_t = 52.0)]
    min_tm: f64,

    #[arg(long, default_value_t = 58.0)]
    max_tm: f64,

    /// Use the salt-adjusted Tm model with this Na+ concentration (mol/L)
    #[arg(long)]
    na: Option<f64>,

    /// Maximum |ΔTm| between paired primers
    #[arg(long, default_value_t = 5.0)]
    max_delta_tm: f64,

    #[arg(long, default_value_t = 0.4)]
    min_cg: f64,

    #[arg(long, default_value_t = 0.6)]
    max_cg: f64,

    /// Require at most 3 C/G among the 5 bases at each 3' end
    #[arg(long, default_value_t = false)]
    cg_clamp: bool,

    /// K-mer frequency cutoff, percent of sequences
    #[arg(long, default_value_t = 20.0)]
    kmer_percent: f64,

    /// Minimum number of sequences carrying a pair
    #[arg(long, default_value_t = 1)]
    min_pair_sequences: usize,

    /// Dimerization energy threshold (more negative is more permissive)
    #[arg(long, default_value_t = -10.0, allow_hyphen_values = true)]
    dimer_threshold: f64,

    /// Threads (rayon pool)
    #[arg(long)]
    threads: Option<usize>,

    /// Debug logging
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn read_corpus(path: &Path) -> anyhow::Result<SequenceSet> {
    let mut set = SequenceSet::new();
    let mut reader =
        parse_fastx_file(path).with_context(|| format!("opening {}", path.display()))?;
    let mut next_id = 0u32;
    while let Some(record) = reader.next() {
        let rec = record?;
        let name = String::from_utf8_lossy(rec.id()).to_string();
        set.push(next_id, name, rec.seq().to_vec());
        next_id += 1;
    }
    Ok(set)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let melt = match args.na {
        Some(na) => MeltMethod::SaltAdjusted { na },
        None => MeltMethod::Wallace,
    };
    let cfg = PrimerConfig::default()
        .primer_lengths(args.min_len, args.max_len)
        .amplicon_window(args.min_amplicon, args.max_amplicon)
        .melting_range(args.min_tm, args.max_tm)
        .melt_method(melt)
        .max_delta_tm(args.max_delta_tm)
        .cg_content(args.min_cg, args.max_cg)
        .cg_clamp(args.cg_clamp)
        .kmer_cutoff(FrequencyCutoff::Percent(args.kmer_percent))
        .pair_cutoff(FrequencyCutoff::Count(args.min_pair_sequences))
        .dimer_threshold(args.dimer_threshold);
    cfg.validate()?;

    let corpus = read_corpus(&args.input)?;
    tracing::info!(sequences = corpus.num_sequences(), "corpus loaded");

    let mut pool = ThreadPoolBuilder::new();
    if let Some(n) = args.threads {
        pool = pool.num_threads(n.max(1));
    }
    let pool = pool.build()?;

    let design = pool.install(|| -> anyhow::Result<Design> {
        let table = ExactMapper::for_config(&cfg).map(corpus.iter());
        tracing::info!(keys = table.len(), "occurrences mapped");
        Ok(design_primers(&table, &corpus, &cfg, &TracingObserver)?)
    })?;

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    writeln!(out, "forward\treverse\tdelta_tm\tsequences\toccurrences")?;
    for pair in &design.pairs {
        let locs: Vec<String> = pair
            .occurrences
            .iter()
            .map(|o| {
                let name = corpus.name(o.sequence_id).unwrap_or("?");
                format!("{name}:{}-{}", o.min_pos, o.max_pos)
            })
            .collect();
        writeln!(
            out,
            "{}\t{}\t{:.1}\t{}\t{}",
            pair.fwd,
            pair.rev,
            pair.delta_tm,
            pair.sequence_count(),
            locs.join(",")
        )?;
    }
    out.flush()?;

    eprintln!(
        "Designed {} pairs: sequences={}, kmer_cutoff={}, lengths={}..={}",
        design.pairs.len(),
        corpus.num_sequences(),
        design.cutoff,
        cfg.min_len(),
        cfg.max_len()
    );
    Ok(())
}
