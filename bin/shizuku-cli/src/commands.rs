use clap::Subcommand;

mod download;
mod inspect;
mod playlist;

#[derive(Subcommand, Clone)]
pub enum ShizukuCommand {
    Download(download::DownloadCommand),
    Inspect(inspect::InspectCommand),
    Playlist(playlist::PlaylistCommand),
}

impl ShizukuCommand {
    pub async fn run(self) -> anyhow::Result<()> {
        match self {
            Self::Download(command) => command.download().await,
            Self::Inspect(command) => command.inspect().await,
            Self::Playlist(command) => command.write().await,
        }
    }
}
