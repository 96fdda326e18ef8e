use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "sprig",
    about = "sprig: a small git-compatible object store",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an empty repository
    Init(InitArgs),
    /// Compute the blob ID of a file, optionally storing it
    HashObject(HashObjectArgs),
    /// Show an object's content, kind or size
    CatFile(CatFileArgs),
    /// List the entries of a tree
    LsTree(LsTreeArgs),
    /// Store the working directory as a tree
    WriteTree,
    /// Create a commit from a tree and advance HEAD
    CommitTree(CommitTreeArgs),
    /// List the refs a remote repository advertises
    LsRemote(LsRemoteArgs),
}

#[derive(Args)]
pub struct InitArgs {
    pub path: Option<PathBuf>,
    /// Branch HEAD points at
    #[arg(short = 'b', long)]
    pub initial_branch: Option<String>,
}

#[derive(Args)]
pub struct HashObjectArgs {
    pub path: PathBuf,
    /// Write the object into the store
    #[arg(short)]
    pub w: bool,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct CatFileMode {
    /// Pretty-print the content
    #[arg(short)]
    pub p: bool,
    /// Show the object kind
    #[arg(short)]
    pub t: bool,
    /// Show the payload size
    #[arg(short)]
    pub s: bool,
}

#[derive(Args)]
pub struct CatFileArgs {
    #[command(flatten)]
    pub mode: CatFileMode,
    pub object: String,
}

#[derive(Args)]
pub struct LsTreeArgs {
    #[arg(long)]
    pub name_only: bool,
    pub tree: String,
}

#[derive(Args)]
pub struct CommitTreeArgs {
    pub tree: String,
    #[arg(short = 'p')]
    pub parents: Vec<String>,
    #[arg(short = 'm', long)]
    pub message: String,
}

#[derive(Args)]
pub struct LsRemoteArgs {
    pub repository: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_init() {
        let cli = Cli::try_parse_from(["sprig", "init"]).unwrap();
        assert!(matches!(cli.command, Command::Init(_)));
    }

    #[test]
    fn parse_init_branch() {
        let cli = Cli::try_parse_from(["sprig", "init", "-b", "main", "/tmp/r"]).unwrap();
        if let Command::Init(args) = cli.command {
            assert_eq!(args.initial_branch.as_deref(), Some("main"));
            assert_eq!(args.path, Some(PathBuf::from("/tmp/r")));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_hash_object_write() {
        let cli = Cli::try_parse_from(["sprig", "hash-object", "-w", "file.txt"]).unwrap();
        if let Command::HashObject(args) = cli.command {
            assert!(args.w);
            assert_eq!(args.path, PathBuf::from("file.txt"));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn cat_file_needs_exactly_one_mode() {
        assert!(Cli::try_parse_from(["sprig", "cat-file", "HEAD"]).is_err());
        assert!(Cli::try_parse_from(["sprig", "cat-file", "-p", "-t", "HEAD"]).is_err());
        let cli = Cli::try_parse_from(["sprig", "cat-file", "-p", "HEAD"]).unwrap();
        if let Command::CatFile(args) = cli.command {
            assert!(args.mode.p);
            assert_eq!(args.object, "HEAD");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_ls_tree_name_only() {
        let cli = Cli::try_parse_from(["sprig", "ls-tree", "--name-only", "HEAD"]).unwrap();
        if let Command::LsTree(args) = cli.command {
            assert!(args.name_only);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_commit_tree_parents() {
        let cli = Cli::try_parse_from([
            "sprig", "commit-tree", "abc", "-p", "p1", "-p", "p2", "-m", "msg",
        ])
        .unwrap();
        if let Command::CommitTree(args) = cli.command {
            assert_eq!(args.tree, "abc");
            assert_eq!(args.parents, vec!["p1", "p2"]);
            assert_eq!(args.message, "msg");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn global_flags() {
        let cli = Cli::try_parse_from(["sprig", "write-tree", "-v", "--format", "json"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(matches!(cli.command, Command::WriteTree));
    }

    #[test]
    fn parse_ls_remote() {
        let cli = Cli::try_parse_from(["sprig", "ls-remote", "github.com/a/b"]).unwrap();
        if let Command::LsRemote(args) = cli.command {
            assert_eq!(args.repository, "github.com/a/b");
        } else { panic!("wrong command"); }
    }
}
