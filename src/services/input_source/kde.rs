use crate::error::Result;
use tracing::debug;
use zbus::Connection;

use super::r#trait::{LayoutId, LayoutRegistry, LayoutSnapshot};

#[zbus::proxy(
    interface = "org.kde.KeyboardLayouts",
    default_service = "org.kde.keyboard",
    default_path = "/Layouts"
)]
trait KeyboardLayouts {
    #[zbus(name = "getLayout")]
    fn get_layout(&self) -> zbus::Result<u32>;

    #[zbus(name = "setLayout")]
    fn set_layout(&self, index: u32) -> zbus::Result<bool>;

    /// (short name, variant, display name) per installed layout
    #[zbus(name = "getLayoutsList")]
    fn get_layouts_list(&self) -> zbus::Result<Vec<(String, String, String)>>;
}

/// KDE Plasma keyboard daemon over the session bus
pub struct KdeLayouts;

impl KdeLayouts {
    pub fn new() -> Self {
        Self
    }

    async fn proxy(connection: &Connection) -> Result<KeyboardLayoutsProxy<'_>> {
        Ok(KeyboardLayoutsProxy::new(connection).await?)
    }

    async fn select(&self, index: usize) -> Result<()> {
        let connection = Connection::session().await?;
        let proxy = Self::proxy(&connection).await?;
        let index = u32::try_from(index)
            .map_err(|_| crate::typer_error!(layout, "layout index {} out of range", index))?;

        if proxy.set_layout(index).await? {
            Ok(())
        } else {
            Err(crate::typer_error!(layout, "KDE refused layout #{}", index))
        }
    }
}

#[async_trait::async_trait]
impl LayoutRegistry for KdeLayouts {
    fn backend_name(&self) -> &'static str {
        "kde"
    }

    async fn snapshot(&self) -> Result<LayoutSnapshot> {
        let connection = Connection::session().await?;
        let proxy = Self::proxy(&connection).await?;

        let layouts: Vec<LayoutId> = proxy
            .get_layouts_list()
            .await?
            .into_iter()
            .map(|(name, variant, _display)| LayoutId::new(name, variant))
            .collect();
        let active = usize::try_from(proxy.get_layout().await?).ok();

        debug!("KDE layouts: {:?}, active: {:?}", layouts, active);
        Ok(LayoutSnapshot { layouts, active })
    }

    async fn activate(&self, _snapshot: &LayoutSnapshot, index: usize) -> Result<()> {
        self.select(index).await
    }

    async fn restore(&self, snapshot: &LayoutSnapshot) -> Result<()> {
        match snapshot.active {
            Some(index) => self.select(index).await,
            None => Ok(()),
        }
    }
}
