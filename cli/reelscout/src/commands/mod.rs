mod search;

use anyhow::Result;
use bpaf::Bpaf;
use indoc::indoc;

use crate::config::Config;

static REELSCOUT_DESCRIPTION: &'_ str = indoc! {"
    Find movies you'll enjoy without the hassle.\n\n

    Type to search the movie catalog. Results follow your query once you stop typing."
};

fn vec_len<T>(x: Vec<T>) -> usize {
    Vec::len(&x)
}

#[derive(Bpaf, Clone, Copy, Debug, PartialEq)]
pub enum Verbosity {
    Verbose(
        /// Increase logging verbosity
        ///
        /// Invoke multiple times for increasing detail.
        #[bpaf(short('v'), long("verbose"), req_flag(()), many, map(vec_len))]
        usize,
    ),

    /// Silence logs except for errors
    #[bpaf(short, long)]
    Quiet,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Verbose(0)
    }
}

#[derive(Bpaf)]
#[bpaf(
    options,
    version,
    descr(REELSCOUT_DESCRIPTION),
    footer("Keys: Esc or Ctrl-C quits, Backspace edits, Ctrl-U clears the query.")
)]
pub struct ReelscoutCli(#[bpaf(external(reelscout_args))] pub ReelscoutArgs);

/// Main reelscout args parser
///
/// To parse the command line, use [`ReelscoutCli`] via [`reelscout_cli()`].
#[derive(Debug, Bpaf)]
#[bpaf(ignore_rustdoc)] // we don't want this struct to be interpreted as a group
pub struct ReelscoutArgs {
    /// Verbose mode
    ///
    /// Invoke multiple times for increasing detail.
    #[bpaf(external, fallback(Default::default()))]
    pub verbosity: Verbosity,
}

impl ReelscoutArgs {
    /// Run the interactive search session.
    pub async fn handle(self, config: Config) -> Result<()> {
        search::run(&config).await
    }
}
