use std::io::{self, Write};

use clap::Parser as ClapParser;

use rustql::{process_query, Database};

#[derive(ClapParser)]
#[command(name = "rustql", about = "A small single-file relational database")]
struct Cli {
    /// Path to the database file. Created if it does not already exist.
    #[arg(long, default_value = "rustql.db")]
    db_path: String,

    /// Page size in bytes, used only when creating a new database file.
    #[arg(long, default_value_t = rustql::page::PAGE_SIZE as u16)]
    page_size: u16,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let mut db = match Database::open(&cli.db_path, cli.page_size) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("failed to open '{}': {e}", cli.db_path);
            std::process::exit(1);
        }
    };

    if atty::is(atty::Stream::Stdin) {
        println!("rustql - a small single-file relational database");
        println!("Type 'exit' to quit\n");

        loop {
            print!("rustql> ");
            io::stdout().flush().unwrap();

            let mut input = String::new();
            if io::stdin().read_line(&mut input).unwrap() == 0 {
                break;
            }
            let query = input.trim();

            if query.eq_ignore_ascii_case("exit") {
                println!("Goodbye!");
                break;
            }
            if query.is_empty() {
                continue;
            }

            match process_query(&mut db, query) {
                Ok(result) => print_result(&result),
                Err(e) => eprintln!("Error: {e}"),
            }
        }
    } else {
        let mut input = String::new();
        io::stdin().read_line(&mut input).unwrap();
        let query = input.trim();

        if !query.is_empty() {
            match process_query(&mut db, query) {
                Ok(result) => print_result(&result),
                Err(e) => eprintln!("Error: {e}"),
            }
        }
    }
}

fn print_result(result: &rustql::executor::ExecResult) {
    match result {
        rustql::executor::ExecResult::Message(msg) => println!("{msg}"),
        rustql::executor::ExecResult::Rows { columns, rows, message } => {
            println!("{}", columns.join(" | "));
            for row in rows {
                let rendered: Vec<String> = row
                    .iter()
                    .map(|v| match v {
                        rustql::page::Value::Null => "NULL".to_string(),
                        rustql::page::Value::Integer(n) => n.to_string(),
                        rustql::page::Value::Text(s) => s.clone(),
                    })
                    .collect();
                println!("{}", rendered.join(" | "));
            }
            println!("{message}");
        }
    }
}
