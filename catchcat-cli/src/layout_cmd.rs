//! Layout command - generate an initial board

use anyhow::{Context, Result};
use clap::Args;

use catchcat_core::generate_layout;
use catchcat_tournament::create_rng;

#[derive(Args)]
pub struct LayoutArgs {
    /// Board side length (4k+1)
    #[arg(long, default_value = "9")]
    pub size: usize,

    /// Print the layout as JSON, ready for a competition config
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: LayoutArgs, seed: Option<u64>) -> Result<()> {
    let mut rng = create_rng(seed);
    let layout = generate_layout(args.size, &mut rng)
        .with_context(|| format!("Failed to generate a layout of size {}", args.size))?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&layout).context("Failed to serialize layout")?
        );
        return Ok(());
    }

    let board = layout.to_board()?;
    let cells: Vec<char> = board.agent_string().chars().collect();
    for (y, row) in cells.chunks(board.size()).enumerate() {
        // odd rows sit half a cell to the right
        let indent = if y % 2 == 1 { " " } else { "" };
        let row: Vec<String> = row.iter().map(char::to_string).collect();
        println!("{}{}", indent, row.join(" "));
    }
    println!("cat: {}", layout.cat);

    Ok(())
}
