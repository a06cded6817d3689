//! find command - Search a tree with a query expression
//!
//! The tree below `--path` (default: the working directory) is enumerated
//! first, then the query is evaluated against the relative paths.

use clap::Args;
use gd_core::{Depth, Query, RemoteStore, Resolver, Result, TreeListing};

use super::ls::{list, render_listing};
use super::{Session, fail, parse_depth};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Find paths matching a query
#[derive(Args, Debug)]
pub struct FindArgs {
    /// Query, e.g. "*.jpg", "a* and not *.tmp", "%d photos*" (folders only)
    pub query: String,

    /// Folder to search (defaults to the working directory)
    #[arg(long)]
    pub path: Option<String>,

    /// How deep to search: all, current, or a number of levels
    #[arg(short, long, default_value = "all", value_parser = parse_depth)]
    pub depth: Depth,

    /// Show object ids next to paths
    #[arg(short = 'a', long = "ids")]
    pub ids: bool,
}

/// Execute the find command
pub async fn execute(
    args: FindArgs,
    parent: Option<&str>,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let session = match Session::open(parent) {
        Ok(s) => s,
        Err(e) => return fail(&formatter, &e),
    };

    match search(&session.resolver(), &args.query, args.path.as_deref(), args.depth).await {
        Ok(matches) => {
            formatter.emit(&matches, || render_matches(&matches, args.ids));
            ExitCode::Success
        }
        Err(e) => fail(&formatter, &e),
    }
}

/// Parse `expression`, enumerate the tree and keep the matching entries
///
/// The query is parsed before anything is listed so a malformed expression
/// costs no remote calls.
pub(crate) async fn search<S: RemoteStore + ?Sized>(
    resolver: &Resolver<'_, S>,
    expression: &str,
    path: Option<&str>,
    depth: Depth,
) -> Result<TreeListing> {
    let query = Query::parse(expression)?;
    let tree = list(resolver, path, depth).await?;
    Ok(query.evaluate(&tree))
}

fn render_matches(matches: &TreeListing, show_ids: bool) -> String {
    if matches.is_empty() {
        "No matches.".to_string()
    } else {
        render_listing(matches, show_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gd_core::memory::{MemoryStore, ROOT_ID};
    use gd_core::{Error, Parent};

    use crate::commands::resolver_for;

    fn photo_store() -> MemoryStore {
        let store = MemoryStore::new();
        let photos = store.add_folder(ROOT_ID, "photos");
        store.add_file(photos.as_str(), "alps.jpg", b"1");
        store.add_file(photos.as_str(), "beach.jpg", b"2");
        store.add_file(photos.as_str(), "alps.png", b"3");
        store.add_file(ROOT_ID, "notes.txt", b"4");
        store
    }

    #[tokio::test]
    async fn test_find_across_tree() {
        let store = photo_store();
        let parent = Parent::new("origin", ROOT_ID, "My Drive");
        let resolver = resolver_for(&store, &parent);

        let matches = search(&resolver, "*.jpg", None, Depth::All).await.unwrap();
        insta::assert_snapshot!(render_matches(&matches, false), @r"
        F  photos/alps.jpg
        F  photos/beach.jpg
        ");

        let matches = search(&resolver, "photos/a* and not *.png", None, Depth::All)
            .await
            .unwrap();
        assert_eq!(matches.paths(), vec!["photos/alps.jpg"]);
    }

    #[tokio::test]
    async fn test_find_folders_only() {
        let store = photo_store();
        let parent = Parent::new("origin", ROOT_ID, "My Drive");
        let matches = search(&resolver_for(&store, &parent), "%d *", None, Depth::All)
            .await
            .unwrap();
        assert_eq!(matches.paths(), vec!["photos"]);
    }

    #[tokio::test]
    async fn test_help_examples_are_valid_queries() {
        use clap::CommandFactory;

        let cli = crate::commands::Cli::command();
        let find = cli.find_subcommand("find").unwrap();
        let query = find.get_arguments().find(|a| a.get_id() == "query").unwrap();
        let help = query.get_help().unwrap().to_string();
        let examples: Vec<&str> = help.split('"').skip(1).step_by(2).collect();
        assert_eq!(examples, vec!["*.jpg", "a* and not *.tmp", "%d photos*"]);
        for example in &examples {
            assert!(Query::parse(example).is_ok(), "{example}");
        }

        let store = photo_store();
        let parent = Parent::new("origin", ROOT_ID, "My Drive");
        let matches = search(&resolver_for(&store, &parent), "%d photos*", None, Depth::All)
            .await
            .unwrap();
        assert_eq!(matches.paths(), vec!["photos"]);
    }

    #[tokio::test]
    async fn test_find_no_matches() {
        let store = photo_store();
        let parent = Parent::new("origin", ROOT_ID, "My Drive");
        let matches = search(&resolver_for(&store, &parent), "*.gif", Some("photos"), Depth::All)
            .await
            .unwrap();
        assert_eq!(render_matches(&matches, false), "No matches.");
    }

    #[tokio::test]
    async fn test_find_rejects_malformed_query_before_listing() {
        let store = photo_store();
        let parent = Parent::new("origin", ROOT_ID, "My Drive");
        let err = search(&resolver_for(&store, &parent), "*.jpg and", Some("missing"), Depth::All)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidQuery(_)));
    }
}
