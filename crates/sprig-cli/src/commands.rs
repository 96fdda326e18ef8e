use std::io::Write;

use anyhow::Context;
use colored::Colorize;
use serde_json::json;
use sprig_sdk::{
    ls_remote, DiscoveryConfig, GitObject, Object, ObjectId, RepoConfig, Repository, Tree,
};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Init(args) => cmd_init(args, format),
        Command::HashObject(args) => cmd_hash_object(args, format),
        Command::CatFile(args) => cmd_cat_file(args, format),
        Command::LsTree(args) => cmd_ls_tree(args, format),
        Command::WriteTree => cmd_write_tree(format),
        Command::CommitTree(args) => cmd_commit_tree(args, format),
        Command::LsRemote(args) => cmd_ls_remote(args, format),
    }
}

fn open_repo() -> anyhow::Result<Repository> {
    Repository::discover_from_cwd(RepoConfig::default())
        .context("not inside a sprig repository")
}

fn print_json(value: serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn cmd_init(args: InitArgs, format: OutputFormat) -> anyhow::Result<()> {
    let path = match args.path {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    let mut config = RepoConfig::default();
    if let Some(branch) = args.initial_branch {
        config.default_branch = branch;
    }
    let repo = Repository::init(&path, config)?;

    if format == OutputFormat::Json {
        return print_json(json!({
            "path": repo.git_dir().display().to_string(),
            "branch": repo.config().default_branch,
        }));
    }
    println!(
        "{} Initialized empty repository in {}",
        "✓".green().bold(),
        repo.git_dir().display().to_string().bold()
    );
    println!("  Branch: {}", repo.config().default_branch.yellow());
    Ok(())
}

fn cmd_hash_object(args: HashObjectArgs, format: OutputFormat) -> anyhow::Result<()> {
    let id = if args.w {
        open_repo()?.hash_file(&args.path, true)?
    } else {
        let data = std::fs::read(&args.path)
            .with_context(|| format!("reading {}", args.path.display()))?;
        sprig_sdk::Blob::new(data).hash()
    };

    if format == OutputFormat::Json {
        return print_json(json!({ "id": id, "written": args.w }));
    }
    println!("{id}");
    Ok(())
}

fn tree_lines(tree: &Tree) -> impl Iterator<Item = String> + '_ {
    tree.iter().map(|entry| {
        format!(
            "{} {} {}\t{}",
            entry.mode,
            entry.mode.target_kind(),
            entry.object_id,
            entry.name
        )
    })
}

fn cmd_cat_file(args: CatFileArgs, format: OutputFormat) -> anyhow::Result<()> {
    let repo = open_repo()?;
    let (id, object) = repo.cat_file(&args.object)?;

    if args.mode.t {
        if format == OutputFormat::Json {
            return print_json(json!({ "id": id, "kind": object.kind() }));
        }
        println!("{}", object.kind());
        return Ok(());
    }
    if args.mode.s {
        let size = object.payload().len();
        if format == OutputFormat::Json {
            return print_json(json!({ "id": id, "size": size }));
        }
        println!("{size}");
        return Ok(());
    }

    if format == OutputFormat::Json {
        return print_json(object_json(&id, &object));
    }
    match object {
        Object::Blob(blob) => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&blob.data)?;
            stdout.flush()?;
        }
        Object::Tree(tree) => tree_lines(&tree).for_each(|line| println!("{line}")),
        Object::Commit(commit) => print!("{}", commit.to_text()),
    }
    Ok(())
}

fn object_json(id: &ObjectId, object: &Object) -> serde_json::Value {
    match object {
        Object::Blob(blob) => json!({
            "id": id,
            "kind": "blob",
            "size": blob.size(),
            "content": String::from_utf8_lossy(&blob.data),
        }),
        Object::Tree(tree) => json!({
            "id": id,
            "kind": "tree",
            "entries": tree.entries(),
        }),
        Object::Commit(commit) => json!({
            "id": id,
            "kind": "commit",
            "tree": commit.tree,
            "parents": commit.parents,
            "author": commit.author.to_string(),
            "committer": commit.committer.to_string(),
            "message": commit.message,
        }),
    }
}

fn cmd_ls_tree(args: LsTreeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let tree = open_repo()?.ls_tree(&args.tree)?;

    if format == OutputFormat::Json {
        return print_json(json!({ "entries": tree.entries() }));
    }
    if args.name_only {
        for entry in &tree {
            println!("{}", entry.name);
        }
    } else {
        tree_lines(&tree).for_each(|line| println!("{line}"));
    }
    Ok(())
}

fn cmd_write_tree(format: OutputFormat) -> anyhow::Result<()> {
    let output = open_repo()?.write_tree()?;

    if format == OutputFormat::Json {
        return print_json(json!({ "id": output.root, "objects_written": output.written.len() }));
    }
    println!("{}", output.root);
    Ok(())
}

fn cmd_commit_tree(args: CommitTreeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let repo = open_repo()?;
    let tree = repo.resolve(&args.tree)?;
    let parents = args
        .parents
        .iter()
        .map(|p| repo.resolve(p))
        .collect::<Result<Vec<_>, _>>()?;
    let outcome = repo.commit_tree(tree, parents, &args.message)?;

    if format == OutputFormat::Json {
        return print_json(json!({ "id": outcome.id, "updated_ref": outcome.updated_ref }));
    }
    println!("{}", outcome.id);
    Ok(())
}

fn cmd_ls_remote(args: LsRemoteArgs, format: OutputFormat) -> anyhow::Result<()> {
    let advertisement = ls_remote(&args.repository, &DiscoveryConfig::default())
        .with_context(|| format!("discovering refs of {}", args.repository))?;

    if format == OutputFormat::Json {
        return print_json(json!({
            "references": advertisement.references,
            "capabilities": advertisement.capabilities(),
        }));
    }
    for reference in advertisement.iter() {
        println!("{}\t{}", reference.id.to_string().yellow(), reference.name);
    }
    if let Some(target) = advertisement.symref("HEAD") {
        eprintln!("{} HEAD → {}", "symref:".dimmed(), target.green());
    }
    Ok(())
}
