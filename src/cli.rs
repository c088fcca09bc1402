//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lavactl")]
#[command(author, version, about = "Test-lab device controller", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to board database (a .ron/.toml file or a directory of them)
    /// Defaults to looking in ./boards/ and /usr/share/lavactl/boards/
    #[arg(long, global = true)]
    pub board_db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Image set flashed by deploy
#[derive(clap::Args, Debug, Clone)]
pub struct ImageArgs {
    /// Boot image (handed to the bootloader on power-on, never flashed)
    #[arg(long)]
    pub boot: String,

    /// System partition image
    #[arg(long)]
    pub system: String,

    /// Userdata partition image
    #[arg(long)]
    pub userdata: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Flash an image set onto a board
    Deploy {
        /// Board name from the board database
        #[arg(short, long)]
        board: String,

        #[command(flatten)]
        images: ImageArgs,

        /// Boot the deployed image and wait for a shell
        #[arg(long)]
        power_on: bool,

        /// Shell command to run on the booted device (repeatable, implies --power-on)
        #[arg(long = "run", value_name = "CMD")]
        run: Vec<String>,
    },

    /// Deploy, boot and copy a local directory into a device partition
    Push {
        /// Board name from the board database
        #[arg(short, long)]
        board: String,

        #[command(flatten)]
        images: ImageArgs,

        /// Partition to write into
        #[arg(long, default_value = "system_partition")]
        partition: String,

        /// Directory inside the partition
        #[arg(long, value_name = "DIR")]
        dest: String,

        /// Local directory whose contents are copied
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Print the version of the board's device shell tool
    Version {
        /// Board name from the board database
        #[arg(short, long)]
        board: String,
    },

    /// Switch an accessory module and print the completion marker
    Signal {
        /// Board name from the board database
        #[arg(short, long)]
        board: String,

        /// Module type [usb, hdmi, sata, eth, lsgpio]
        #[arg(short, long)]
        module: String,

        /// Command keyword, see list-modules
        #[arg(short, long)]
        command: String,

        /// Named module (defaults to the board's module of that type)
        #[arg(long)]
        name: Option<String>,
    },

    /// List boards in the board database
    ListBoards,

    /// List accessory module types and their commands
    ListModules,
}
