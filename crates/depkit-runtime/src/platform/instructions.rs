//! Manual installation instructions.
//!
//! Plain text keyed by (platform, dependency). Every block carries a download
//! URL and at least one command-line alternative.

use std::fmt::Write;

use depkit_core::Platform;

use super::{OLLAMA, PYTHON, display_name};

const OLLAMA_DOWNLOAD_URL: &str = "https://ollama.com/download";
const PYTHON_DOWNLOAD_URL: &str = "https://www.python.org/downloads/";

/// Small builder producing the sectioned instruction layout.
#[derive(Default)]
struct Instructions {
    text: String,
}

impl Instructions {
    fn header(title: &str) -> Self {
        let mut builder = Self::default();
        let _ = writeln!(builder.text, "{title}");
        let _ = writeln!(builder.text, "{}", "=".repeat(title.len()));
        builder
    }

    fn section(mut self, title: &str) -> Self {
        let _ = write!(self.text, "\n{title}:\n");
        self
    }

    fn command(mut self, command: &str) -> Self {
        let _ = writeln!(self.text, "  $ {command}");
        self
    }

    fn line(mut self, line: &str) -> Self {
        let _ = writeln!(self.text, "  {line}");
        self
    }

    fn finish(self) -> String {
        self.text
    }
}

/// Manual instructions for `dependency` on `platform`.
pub fn manual_instructions_for(platform: Platform, dependency: &str) -> String {
    match (platform, dependency) {
        (Platform::MacOs, OLLAMA) => Instructions::header("Install Ollama on macOS")
            .section("Download the app")
            .line(&format!("{OLLAMA_DOWNLOAD_URL}/mac"))
            .line("Unzip it and move Ollama.app to /Applications, then open it once.")
            .section("Or use Homebrew")
            .command("brew install ollama")
            .command("brew services start ollama")
            .finish(),
        (Platform::MacOs, PYTHON) => Instructions::header("Install Python on macOS")
            .section("Download the installer")
            .line(&format!("{PYTHON_DOWNLOAD_URL}macos/"))
            .section("Or use Homebrew")
            .command("brew install python@3.12")
            .section("Homebrew itself")
            .command(
                r#"/bin/bash -c "$(curl -fsSL https://raw.githubusercontent.com/Homebrew/install/HEAD/install.sh)""#,
            )
            .finish(),
        (Platform::Windows, OLLAMA) => Instructions::header("Install Ollama on Windows")
            .section("Download the installer")
            .line(&format!("{OLLAMA_DOWNLOAD_URL}/windows"))
            .line("Run OllamaSetup.exe; Ollama starts in the system tray.")
            .section("Or use winget")
            .command("winget install --id Ollama.Ollama -e")
            .finish(),
        (Platform::Windows, PYTHON) => Instructions::header("Install Python on Windows")
            .section("Download the installer")
            .line(&format!("{PYTHON_DOWNLOAD_URL}windows/"))
            .line("Tick \"Add python.exe to PATH\" during setup.")
            .section("Or use winget")
            .command("winget install --id Python.Python.3.12 -e")
            .section("Or use Scoop")
            .command("scoop install python")
            .finish(),
        (Platform::Linux, OLLAMA) => Instructions::header("Install Ollama on Linux")
            .section("Official install script")
            .command("curl -fsSL https://ollama.com/install.sh | sh")
            .section("Start the service")
            .command("sudo systemctl start ollama")
            .line(&format!("More options: {OLLAMA_DOWNLOAD_URL}/linux"))
            .finish(),
        (Platform::Linux, PYTHON) => Instructions::header("Install Python on Linux")
            .section("Debian/Ubuntu")
            .command("sudo apt-get install -y python3 python3-pip python3-venv")
            .section("Fedora/RHEL")
            .command("sudo dnf install -y python3 python3-pip")
            .section("Arch Linux")
            .command("sudo pacman -S --noconfirm python python-pip")
            .section("openSUSE")
            .command("sudo zypper install -y python3 python3-pip")
            .line(&format!("Source and other builds: {PYTHON_DOWNLOAD_URL}"))
            .finish(),
        _ => generic_instructions(platform, dependency),
    }
}

/// Fallback block for unknown dependencies or unsupported platforms.
pub fn generic_instructions(platform: Platform, dependency: &str) -> String {
    let url = match dependency {
        OLLAMA => OLLAMA_DOWNLOAD_URL,
        PYTHON => PYTHON_DOWNLOAD_URL,
        _ => "https://repology.org/",
    };
    let name = display_name(dependency);
    Instructions::header(&format!("Install {name} on {}", platform.display_name()))
        .line("Automatic installation is not available here.")
        .section("Download")
        .line(url)
        .section("Then confirm it is on your PATH")
        .command(&format!("{dependency} --version"))
        .finish()
}
