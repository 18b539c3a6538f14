use clap::Parser;

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    sempsync completions bash > ~/.bash_completion.d/sempsync\n\n\
                  Generate zsh completions:\n    sempsync completions zsh > ~/.zfunc/_sempsync\n\n\
                  Generate fish completions:\n    sempsync completions fish > ~/.config/fish/completions/sempsync.fish")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    pub shell: String,
}
