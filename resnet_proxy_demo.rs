// resnet_proxy_demo.rs
// Runs one pruning episode against the ResNet proxy environment.
//
// Usage:
//   resnet_proxy_demo [config.json] [--action <a>] [--seed <n>] [--json]
//
// Without a config file the ResNet-20 FLOPs preset is used (ratio 0.5,
// floor 0.1, upper bound only). The policy proposes a constant action
// (default 1.0), or uniform random actions when --seed is given.
//
// Output:
//   - one line per decided layer (observation features and applied action)
//   - spent params/flops and their ratio to the unpruned network
//   - or the whole trajectory as JSON with --json

use resnet_prune_env::config::{load_config, ProxyConfig, ResourceMetric};
use resnet_prune_env::env::{run_episode, Environment, Observation, ResNetProxy, Trajectory};
use resnet_prune_env::utils::logging::init_tracing;
use resnet_prune_env::utils::SimpleRng;
use std::process;

const DEFAULT_RATIO: f64 = 0.5;
const DEFAULT_FLOOR: f64 = 0.1;
const DEFAULT_ACTION: f64 = 1.0;

/// Action source for the episode.
#[derive(Debug, Clone, PartialEq)]
enum Policy {
    Constant(f64),
    Random(u64),
}

#[derive(Debug, Clone, PartialEq)]
struct DemoOptions {
    config_path: Option<String>,
    policy: Policy,
    json: bool,
}

fn parse_args(args: &[String]) -> Result<DemoOptions, String> {
    let mut options = DemoOptions {
        config_path: None,
        policy: Policy::Constant(DEFAULT_ACTION),
        json: false,
    };

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--json" => options.json = true,
            "--action" => {
                let raw = iter.next().ok_or("--action requires a value")?;
                let action: f64 = raw
                    .parse()
                    .map_err(|_| format!("invalid action '{}'", raw))?;
                options.policy = Policy::Constant(action);
            }
            "--seed" => {
                let raw = iter.next().ok_or("--seed requires a value")?;
                let seed: u64 = raw.parse().map_err(|_| format!("invalid seed '{}'", raw))?;
                options.policy = Policy::Random(seed);
            }
            flag if flag.starts_with("--") => return Err(format!("unknown flag '{}'", flag)),
            path => options.config_path = Some(path.to_string()),
        }
    }

    Ok(options)
}

fn config_from_options(options: &DemoOptions) -> Result<ProxyConfig, String> {
    match &options.config_path {
        Some(path) => load_config(path).map_err(|err| format!("{}: {}", path, err)),
        None => Ok(ProxyConfig::resnet20(
            ResourceMetric::Flops,
            DEFAULT_RATIO,
            DEFAULT_FLOOR,
            false,
        )),
    }
}

fn run(options: &DemoOptions) -> Result<Trajectory, String> {
    let config = config_from_options(options)?;
    let mut env = ResNetProxy::new(&config).map_err(|err| err.to_string())?;

    let mut rng = match options.policy {
        Policy::Random(seed) => Some(SimpleRng::new(seed)),
        Policy::Constant(_) => None,
    };
    run_episode(&mut env, |_: &Observation| match (&options.policy, rng.as_mut()) {
        (Policy::Random(_), Some(rng)) => rng.gen_action(),
        (Policy::Constant(action), _) => *action,
        (Policy::Random(_), None) => DEFAULT_ACTION,
    })
    .map_err(|err| err.to_string())?;
    debug_assert!(env.is_done());

    env.trajectory()
        .ok_or_else(|| "episode produced no trajectory".to_string())
}

fn print_report(trajectory: &Trajectory) {
    println!("Total params: {:.6} M", trajectory.total_params);
    println!("Total flops:  {:.6} M", trajectory.total_flops);
    println!("Limiting metric: {}", trajectory.metric);

    for (i, (observation, action)) in trajectory
        .observations
        .iter()
        .zip(&trajectory.actions)
        .enumerate()
    {
        let features = observation.to_array();
        println!(
            "{}\t {:.2} {:.2} {:.2} {:.2} {:.2} {:.2}\t{:.4}\t{}",
            i + 1,
            features[0],
            features[1],
            features[2],
            features[3],
            features[4],
            features[5],
            action,
            trajectory.filter_counts[i + 1]
        );
    }

    println!(
        "Spent params: {:.6} M ({:.4})",
        trajectory.spent_params, trajectory.params_ratio
    );
    println!(
        "Spent flops:  {:.6} M ({:.4})",
        trajectory.spent_flops, trajectory.flops_ratio
    );
}

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("{}", err);
            eprintln!("usage: resnet_proxy_demo [config.json] [--action <a>] [--seed <n>] [--json]");
            process::exit(2);
        }
    };

    let trajectory = match run(&options) {
        Ok(trajectory) => trajectory,
        Err(err) => {
            eprintln!("episode failed: {}", err);
            process::exit(1);
        }
    };

    if options.json {
        match serde_json::to_string_pretty(&trajectory) {
            Ok(json) => println!("{}", json),
            Err(err) => {
                eprintln!("failed to serialize trajectory: {}", err);
                process::exit(1);
            }
        }
        return;
    }

    print_report(&trajectory);
}
