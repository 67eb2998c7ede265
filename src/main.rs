use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::Parser;

use notemark::{Block, Config, Renderer};

#[derive(Parser)]
#[command(name = "notemark")]
#[command(about = "Render note Markdown with quiz and slide blocks to sanitized HTML")]
struct Cli {
    /// Input Markdown file (`-` for stdin)
    input: Option<PathBuf>,

    /// Output HTML file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML config file (defaults to notemark.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print parsed quiz and slide blocks as JSON instead of HTML
    #[arg(long)]
    dump_tokens: bool,

    /// Print the stylesheet for highlighted code and exit
    #[arg(long)]
    highlight_css: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match Config::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => Config::load(Path::new("notemark.toml")),
    };

    if cli.highlight_css {
        match notemark::highlight::highlight_css(&config.highlight.theme) {
            Ok(css) => print!("{}", css),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    // Read input
    let content = match read_input(cli.input.as_deref()) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading input: {}", e);
            std::process::exit(1);
        }
    };

    let output = if cli.dump_tokens {
        match dump_tokens(&notemark::parse_with_config(&content, &config)) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        match Renderer::new(config).render(&content) {
            Ok(html) => html,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    };

    match &cli.output {
        Some(path) => {
            if let Err(e) = fs::write(path, output) {
                eprintln!("Error writing {}: {}", path.display(), e);
                std::process::exit(1);
            }
            log::info!("wrote {}", path.display());
        }
        None => print!("{}", output),
    }
}

fn read_input(path: Option<&Path>) -> io::Result<String> {
    match path {
        Some(path) if path != Path::new("-") => fs::read_to_string(path),
        _ => {
            let mut content = String::new();
            io::stdin().read_to_string(&mut content)?;
            Ok(content)
        }
    }
}

fn dump_tokens(blocks: &[Block]) -> serde_json::Result<String> {
    let tokens: Vec<serde_json::Value> = blocks
        .iter()
        .filter_map(|block| match block {
            Block::Quiz(quiz) => Some(serde_json::to_value(quiz)),
            Block::Slides(deck) => Some(serde_json::to_value(deck)),
            _ => None,
        })
        .collect::<Result<_, _>>()?;
    let mut json = serde_json::to_string_pretty(&tokens)?;
    json.push('\n');
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_output_and_config() {
        let cli =
            Cli::try_parse_from(["notemark", "note.md", "-o", "note.html", "--config", "c.toml"])
                .unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("note.md")));
        assert_eq!(cli.output, Some(PathBuf::from("note.html")));
        assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
        assert!(!cli.dump_tokens);
    }

    #[test]
    fn dump_tokens_lists_only_custom_blocks() {
        let blocks = notemark::parse("# H\n:::quiz T\n? Q\n:::\n");
        let json = dump_tokens(&blocks).unwrap();
        let tokens: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0]["title"], "T");
        assert_eq!(tokens[0]["questions"][0]["question"], "Q");
    }
}
