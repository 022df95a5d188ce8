pub fn handle_command(input: &str) -> Result<(), String> {
    match input.to_lowercase().as_str() {
        "help" => {
            println!("\n📚 StudyMate Commands:");
            println!("  load <files...>   - Ingest PDF/TXT/MD files into this session");
            println!("  ask <question>    - Answer a question from the loaded documents");
            println!("  cite <question>   - Same, with source citations");
            println!("  quiz [n] [topic]  - Generate a multiple-choice quiz");
            println!();

            println!("🔀 Mode Commands:");
            println!("  mode qa           - Free text is answered as a question (default)");
            println!("  mode cite         - Free text is answered with citations");
            println!("  mode quiz         - Free text becomes a quiz topic");
            println!();

            println!("⚙️ Session Commands:");
            println!("  history - Show the conversation so far");
            println!("  stats   - Show pages/chunks loaded this session");
            println!("  reset   - Discard documents and history, start fresh");
            println!("  help    - Show this help menu");
            println!("  exit    - Exit the program");
            Ok(())
        }
        "exit" | "quit" => {
            println!("👋 Goodbye!");
            std::process::exit(0);
        }
        _ => Err("Unknown system command. Type 'help' for available commands.".to_string()),
    }
}
