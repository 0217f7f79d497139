use leadline::cli::{classify, run};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run() {
        let kind = classify(&e);
        eprintln!("{}: {}", kind.prefix(), e);

        // Show error chain if available
        let mut source = e.source();
        if source.is_some() && kind.exit_code() > 1 {
            eprintln!("\nCaused by:");
            let mut indent = 1;
            while let Some(err) = source {
                eprintln!("{:indent$}  {}", "", err);
                source = err.source();
                indent += 1;
            }
        }
        std::process::exit(kind.exit_code());
    }
}
