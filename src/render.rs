//! Unit drop-in generation
//!
//! Turns a catalog descriptor into the text of its `dapp.conf`. Output is a pure
//! function of the descriptor.

use crate::catalog::{DappDescriptor, Port};
use crate::error::FsError;

const HEADER: &str = "#\n\
# Automatically generated from dApp Hub catalog\n\
# Do not edit\n\
#\n";

/// Directory the image tarballs are preinstalled into
pub const PREINSTALL_DIR: &str = "/var/lib/docker/preinstall";

/// Render the `dapp.conf` drop-in for a descriptor.
///
/// Fails with [`FsError::MalformedEntity`] when a field the unit needs is
/// missing or was loaded from a value of the wrong type, when the image is empty, or when the result would not be ASCII.
pub fn render_unit(dapp: &DappDescriptor) -> Result<String, FsError> {
    let malformed = |reason: &str| FsError::malformed(&dapp.name, reason);

    let description = dapp
        .description
        .as_deref()
        .ok_or_else(|| malformed("missing or invalid field `description`"))?;
    let image = dapp
        .image
        .as_deref()
        .ok_or_else(|| malformed("missing or invalid field `image`"))?;
    if image.is_empty() {
        return Err(malformed("field `image` is empty"));
    }
    let ports = dapp
        .ports
        .as_deref()
        .ok_or_else(|| malformed("missing or invalid field `ports`"))?;

    let ports = ports
        .iter()
        .enumerate()
        .map(|(i, p)| {
            port_parts(p)
                .ok_or_else(|| malformed(&format!("port #{i} has no valid `port` or `protocol`")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let wants = ports
        .iter()
        .filter(|(_, _, public)| *public)
        .map(|(port, protocol, _)| format!("Wants=forward-port@{port}-{protocol}.service"))
        .collect::<Vec<_>>()
        .join("\n");

    let published = ports
        .iter()
        .map(|(port, protocol, _)| format!("-p{port}/{protocol}"))
        .collect::<Vec<_>>()
        .join(" ");

    let mut conf = String::new();
    conf.push_str(HEADER);
    conf.push_str("[Unit]\n");
    conf.push_str(&format!("Description={description}\n"));
    conf.push_str(&wants);
    conf.push_str("\n\n");

    conf.push_str("[Service]\n");
    conf.push_str(&format!("Environment=DAPP_DOCKER_PORTS=\"{published}\""));
    conf.push_str("\n# Making sure we overwrite previous values\n");
    conf.push_str(&format!("Environment=DAPP_DOCKER_IMAGE={image}\n"));
    conf.push_str(&format!(
        "Environment=DAPP_DOCKER_IMAGE_FILE={PREINSTALL_DIR}/{}.tar\n",
        image_file_stem(image)
    ));
    conf.push('\n');

    if !conf.is_ascii() {
        return Err(malformed("generated content is not ASCII"));
    }

    Ok(conf)
}

/// Image name flattened into a file name: `/` and `:` become `_`
pub fn image_file_stem(image: &str) -> String {
    image.replace(['/', ':'], "_")
}

fn port_parts(port: &Port) -> Option<(u16, &str, bool)> {
    Some((port.port?, port.protocol.as_deref()?, port.is_public()))
}
