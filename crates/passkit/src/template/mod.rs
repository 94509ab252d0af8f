//! Content sources for the bundle: images, localizations and other assets.
//!
//! A [`PassTemplate`] can either stage its content onto a directory or hand
//! it over as an in-memory [`FileSet`]. Both views must describe the same
//! files.

pub mod folder;
pub mod fs;
pub mod memory;

pub use folder::FolderTemplate;
pub use memory::InMemoryTemplate;

use crate::bundle::FileSet;
use crate::Result;
use std::path::Path;

/// Well-known image names of a pass bundle.
pub mod images {
    pub const ICON: &str = "icon.png";
    pub const ICON_RETINA: &str = "icon@2x.png";
    pub const ICON_RETINA_HD: &str = "icon@3x.png";
    pub const LOGO: &str = "logo.png";
    pub const LOGO_RETINA: &str = "logo@2x.png";
    pub const LOGO_RETINA_HD: &str = "logo@3x.png";
    pub const THUMBNAIL: &str = "thumbnail.png";
    pub const THUMBNAIL_RETINA: &str = "thumbnail@2x.png";
    pub const THUMBNAIL_RETINA_HD: &str = "thumbnail@3x.png";
    pub const STRIP: &str = "strip.png";
    pub const STRIP_RETINA: &str = "strip@2x.png";
    pub const STRIP_RETINA_HD: &str = "strip@3x.png";
    pub const BACKGROUND: &str = "background.png";
    pub const BACKGROUND_RETINA: &str = "background@2x.png";
    pub const BACKGROUND_RETINA_HD: &str = "background@3x.png";
    pub const FOOTER: &str = "footer.png";
    pub const FOOTER_RETINA: &str = "footer@2x.png";
    pub const FOOTER_RETINA_HD: &str = "footer@3x.png";
    pub const PERSONALIZATION_LOGO: &str = "personalizationLogo.png";
    pub const PERSONALIZATION_LOGO_RETINA: &str = "personalizationLogo@2x.png";
    pub const PERSONALIZATION_LOGO_RETINA_HD: &str = "personalizationLogo@3x.png";
}

/// Supplies the static content of a pass bundle.
pub trait PassTemplate {
    /// Write every template file below `dir`, keeping relative paths.
    fn provision(&self, dir: &Path) -> Result<()>;

    /// Every template file keyed by forward-slash relative path.
    fn all_files(&self) -> Result<FileSet>;
}

/// Bundle path of `name` inside the `.lproj` directory of `locale`.
///
/// A blank locale yields `name` unchanged.
pub fn localized_path(name: &str, locale: &str) -> String {
    let locale = locale.trim();
    if locale.is_empty() {
        name.to_string()
    } else {
        format!("{locale}.lproj/{name}")
    }
}
