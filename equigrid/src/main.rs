// src/main.rs
//
// Policy evaluation CLI for equigrid.
//
// Constraints:
// - Reward profile precedence:
//     --profile overrides env;
//     if missing use EQUIGRID_REWARD_PROFILE (default Balanced).
// - --scenario loads a YAML scenario instead of the built-in one; env
//   overrides still apply on top.
// - Deterministic runs via --seed; results do not depend on --threads.
// - Print one run header, then one summary line per policy.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use serde::Serialize;

use equigrid::config::{resolve_effective_profile, Config, RewardProfile};
use equigrid::rl::{run_replicates, EvalConfig, PolicyEvaluation, PolicyKind};
use equigrid::scenario::ScenarioRandConfig;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ProfileArg {
    Balanced,
    EquityFirst,
    Renewable,
}

#[derive(Debug, Parser)]
#[command(
    name = "equigrid",
    about = "Energy-capacity planning model: Monte Carlo policy evaluation",
    version
)]
struct Args {
    /// Policy to evaluate (repeatable): noop, random, greedy, equity_first,
    /// priority, lookahead.
    #[arg(long = "policy", default_values_t = vec![PolicyKind::Greedy])]
    policies: Vec<PolicyKind>,

    /// Replicates per policy.
    #[arg(long, default_value_t = 100)]
    runs: u64,

    /// Step bound per episode.
    #[arg(long, default_value_t = 50)]
    max_steps: u64,

    /// Base seed; replicate k uses seed + k.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Draw a random scenario per replicate.
    #[arg(long)]
    randomize: bool,

    /// Worker threads.
    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// Reward profile preset (optional).
    /// If omitted, uses EQUIGRID_REWARD_PROFILE (default Balanced).
    #[arg(long, value_enum)]
    profile: Option<ProfileArg>,

    /// YAML scenario file.
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Write eval_summary.json and eval_runs.jsonl here.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Verbosity: -v, -vv
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Serialize)]
struct EvalSummaryFile<'a> {
    scenario: &'a str,
    profile: &'a str,
    runs: u64,
    max_steps: u64,
    seed: u64,
    randomize: bool,
    policies: &'a [PolicyEvaluation],
}

fn fnv1a64(s: &str) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;
    let mut h = FNV_OFFSET;
    for b in s.as_bytes() {
        h ^= *b as u64;
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

fn load_config(args: &Args, profile: RewardProfile, explicit: bool) -> Result<Config> {
    match &args.scenario {
        None => Ok(Config::from_env_or_profile(profile)),
        Some(path) => {
            let mut cfg = Config::from_yaml_file(path)
                .with_context(|| format!("loading scenario {}", path.display()))?;
            // A scenario file carries its own weights unless a profile was chosen.
            if explicit {
                cfg.apply_profile(profile);
            }
            cfg.apply_env_overrides();
            Ok(cfg)
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let cli_profile = args.profile.map(|p| match p {
        ProfileArg::Balanced => RewardProfile::Balanced,
        ProfileArg::EquityFirst => RewardProfile::EquityFirst,
        ProfileArg::Renewable => RewardProfile::Renewable,
    });

    // CLI > env > default
    let effective = resolve_effective_profile(cli_profile);
    effective.log_startup();
    let profile = effective.profile;

    let cfg = load_config(&args, profile, cli_profile.is_some())?;
    cfg.validate().context("invalid scenario after env overrides")?;
    let cfg_hash = fnv1a64(&format!("{cfg:?}"));

    println!(
        "equigrid | scenario={} | cfg_hash=0x{:016x} | profile={} | runs={} | max_steps={} | seed={} | randomize={} | threads={}",
        cfg.name,
        cfg_hash,
        profile.as_str(),
        args.runs,
        args.max_steps,
        args.seed,
        args.randomize,
        args.threads,
    );

    let eval = EvalConfig {
        runs: args.runs,
        max_steps: args.max_steps,
        base_seed: args.seed,
        randomize: args.randomize.then(ScenarioRandConfig::default),
        threads: args.threads,
    };

    let mut runs_writer = match &args.output_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating output dir {}", dir.display()))?;
            let path = dir.join("eval_runs.jsonl");
            let file = fs::File::create(&path)
                .with_context(|| format!("creating {}", path.display()))?;
            Some(BufWriter::new(file))
        }
        None => None,
    };

    let mut evaluations = Vec::with_capacity(args.policies.len());
    for &kind in &args.policies {
        if args.verbose >= 1 {
            eprintln!("[eval] policy={} runs={}", kind.as_str(), args.runs);
        }

        let episodes = run_replicates(&cfg, kind, &eval)
            .with_context(|| format!("evaluating policy {}", kind.as_str()))?;

        if args.verbose >= 2 {
            for ep in &episodes {
                eprintln!(
                    "[eval] policy={} episode={} seed={} steps={} reward={:.4} end={}",
                    kind.as_str(),
                    ep.episode_id,
                    ep.seed,
                    ep.steps,
                    ep.total_reward,
                    ep.termination_reason.as_str()
                );
            }
        }

        if let Some(w) = runs_writer.as_mut() {
            for ep in &episodes {
                serde_json::to_writer(&mut *w, ep)?;
                w.write_all(b"\n")?;
            }
        }

        let ev = PolicyEvaluation::from_episodes(kind.as_str(), &episodes);
        let terminations: Vec<String> = ev
            .terminations
            .iter()
            .map(|(k, v)| format!("{k}:{v}"))
            .collect();
        println!(
            "policy={:<12} reward={:>10.4} ±{:.4} (sd {:.4}) | discounted={:>10.4} | steps={:>6.2} | final_budget={:>9.2} | unserved={:.2} | end={}",
            ev.policy,
            ev.total_reward.mean,
            ev.total_reward.ci95,
            ev.total_reward.stddev,
            ev.discounted_reward.mean,
            ev.steps.mean,
            ev.final_budget.mean,
            ev.final_unserved_cities.mean,
            terminations.join(",")
        );
        evaluations.push(ev);
    }

    if let Some(mut w) = runs_writer {
        w.flush()?;
    }

    if let Some(dir) = &args.output_dir {
        let summary = EvalSummaryFile {
            scenario: &cfg.name,
            profile: profile.as_str(),
            runs: args.runs,
            max_steps: args.max_steps,
            seed: args.seed,
            randomize: args.randomize,
            policies: &evaluations,
        };
        let path = dir.join("eval_summary.json");
        let json = serde_json::to_string_pretty(&summary)?;
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        if args.verbose >= 1 {
            eprintln!("[eval] wrote {}", path.display());
        }
    }

    Ok(())
}
