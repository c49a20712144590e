use std::fs;
use std::fs::File;
use std::io;
use std::io::Write;
use std::path::Path;

pub(crate) const CONFIG_SAMPLE: &str = r#"[telegram]
bot_token = "123456:replace-with-your-bot-token"
default_channel = "@my_channel"
# api_url = "https://api.telegram.org"

# For the file locations, If you want it to be relative to the executable directory
# use ${exe_dir}/location
[paths]
vault_dir = "${exe_dir}/vault"
scheduled_dir = "${exe_dir}/scheduled"
# Attachments are looked up here, defaults to vault_dir
# media_dir = "${exe_dir}/vault/media"

[defaults]
max_length = 4096
sweep_interval_secs = 300

[log]
level = "Info"
log_to_console = true
# location = "${exe_dir}/logs/telepost.log"
"#;

pub(crate) fn write_sample_cfg(file_path: &Path) -> io::Result<()> {
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(file_path)?;
    file.write_all(CONFIG_SAMPLE.as_bytes())
}
