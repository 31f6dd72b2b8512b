use latin_rect::partition::{run_count, CountConfig, Executor, Partition};

fn main() {
    let mut cfg = CountConfig::default();
    let mut validate_only = false;

    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--test" | "--validate" => {
                validate_only = true;
                i += 1;
            }
            "--rows" | "-r" => {
                let v = args.get(i + 1).unwrap_or_else(|| usage_and_exit(2));
                cfg.rows = v.parse().unwrap_or_else(|_| usage_and_exit(2));
                i += 2;
            }
            "--cols" | "-n" => {
                let v = args.get(i + 1).unwrap_or_else(|| usage_and_exit(2));
                cfg.order = v.parse().unwrap_or_else(|_| usage_and_exit(2));
                i += 2;
            }
            "--completion" => {
                cfg.completion = true;
                i += 1;
            }
            "--workers" => {
                let v = args.get(i + 1).unwrap_or_else(|| usage_and_exit(2));
                cfg.workers = v.parse().unwrap_or_else(|_| usage_and_exit(2));
                i += 2;
            }
            "--executor" => {
                cfg.executor = match args.get(i + 1).map(String::as_str) {
                    Some("rayon") => Executor::Rayon,
                    Some("queue") => Executor::Queue,
                    _ => usage_and_exit(2),
                };
                i += 2;
            }
            "--partition" => {
                cfg.partition = match args.get(i + 1).map(String::as_str) {
                    Some("canonical") => Partition::Canonical,
                    Some("second-row") => Partition::SecondRow,
                    _ => usage_and_exit(2),
                };
                i += 2;
            }
            "--first-column" => {
                let v = args.get(i + 1).unwrap_or_else(|| usage_and_exit(2));
                let column = v
                    .split(',')
                    .map(|x| x.trim().parse::<u8>())
                    .collect::<Result<Vec<_>, _>>()
                    .unwrap_or_else(|_| usage_and_exit(2));
                cfg.first_column = Some(column);
                i += 2;
            }
            "--report-every" => {
                let v = args.get(i + 1).unwrap_or_else(|| usage_and_exit(2));
                cfg.report_every = v.parse().unwrap_or_else(|_| usage_and_exit(2));
                i += 2;
            }
            "--help" | "-h" => usage_and_exit(0),
            _ => usage_and_exit(2),
        }
    }

    if validate_only {
        match latin_rect::validate::validate_known_counts() {
            Ok(()) => {
                println!("Validation OK: bundled counts and identities hold.");
                return;
            }
            Err(e) => {
                eprintln!("Validation FAILED: {e}");
                std::process::exit(1);
            }
        }
    }

    let report = match run_count(&cfg) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let (r, n) = (cfg.rows, cfg.order);
    let c = report.rectangles;
    println!(
        "({r},{n}): positive={} negative={} total={} difference={}",
        c.positive,
        c.negative,
        c.total(),
        c.difference()
    );
    if let Some(c) = report.completed {
        println!(
            "({},{n}): positive={} negative={} total={} difference={}",
            r + 1,
            c.positive,
            c.negative,
            c.total(),
            c.difference()
        );
    }
    println!(
        "{} unit(s) in {:.3}s",
        report.units,
        report.elapsed.as_secs_f64()
    );
}

fn usage_and_exit(code: i32) -> ! {
    eprintln!(
        "Usage:\n  latin-rect --rows R --cols N [--completion] [--workers W] [--executor rayon|queue]\n             [--partition canonical|second-row] [--first-column 1,3,4] [--report-every K]\n  latin-rect --test\n\nOptions:\n  --rows/-r R               Number of rows (2..=10, default: 5)\n  --cols/-n N               Order (R..=16, default: 6)\n  --completion              Also count the (N,N) completions (requires R = N-1)\n  --workers W               Worker threads (default: auto-detect)\n  --executor rayon|queue    Thread scheduling (default: rayon)\n  --partition canonical|second-row\n                            Work units: canonical first columns, or raw second rows\n  --first-column 1,A,B      Count one canonical first column only (unscaled)\n  --report-every K          Print progress every K finished units (default: off)\n  --test/--validate         Validate bundled counts (fast, deterministic)\n"
    );
    std::process::exit(code)
}
