fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(game) = args.first() else {
        eprintln!("Usage: incircuit <game> [operation[:key] | soak[:passes]]...");
        eprintln!("Games:");
        for entry in incircuit::GAMES.iter() {
            eprintln!("  {:<20} {}", entry.name, entry.description);
        }
        eprintln!("Operations:");
        for operation in incircuit::Operation::ALL {
            eprintln!("  {:<20} {}", operation.name(), operation.label());
        }
        std::process::exit(1);
    };

    if incircuit::registry::find(game).is_none() {
        eprintln!(
            "Unknown game '{}'. Supported: {}",
            game,
            incircuit::registry::names().join(", ")
        );
        std::process::exit(1);
    }

    match incircuit::run_args(&args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(error) => {
            eprintln!("{:#}", error);
            std::process::exit(1);
        }
    }
}
