//! List commands implementation

use lavactl_core::BoardDatabase;
use lavactl_lmp::ModuleKind;

/// List all boards in the database
pub fn list_boards(db: &BoardDatabase) {
    println!("Known boards:");
    println!();
    println!("{:<16} {:<20} {:<20} Partitions", "Name", "Control", "Shell");
    println!("{}", "-".repeat(72));

    for board in db.iter() {
        let partitions: Vec<&str> = board.partitions.keys().map(String::as_str).collect();
        println!(
            "{:<16} {:<20} {:<20} {}",
            board.name,
            board.control_command,
            board.shell_command,
            partitions.join(", ")
        );
    }
}

/// List accessory module types and their commands
pub fn list_modules() {
    println!("Accessory modules:");
    println!();
    for kind in ModuleKind::ALL {
        println!("  {:<8} - {}", kind.name(), kind.keywords().join(", "));
    }
}
