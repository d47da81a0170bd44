//! Receipt PDF rendering
//!
//! A5-ish single page layout: branded header, order metadata, line item
//! table, totals. Output goes to a uniquely named file in the temp dir.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use printpdf::{BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rgb};
use shared::models::{Order, ShippingMethod, StoreInfo};

use crate::core::TemplateFlags;

use super::assets::{parse_accent_color, AssetResolver, DEFAULT_ACCENT};
use super::{DocumentKind, RenderError};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const LINE_HEIGHT_MM: f32 = 6.0;

/// Renders order receipts to PDF files
#[derive(Debug, Clone)]
pub struct ReceiptRenderer {
    temp_dir: PathBuf,
    flags: TemplateFlags,
    assets: AssetResolver,
}

impl ReceiptRenderer {
    pub fn new(temp_dir: impl Into<PathBuf>, flags: TemplateFlags, assets: AssetResolver) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            flags,
            assets,
        }
    }

    /// Render a document for the order, returning the output path
    ///
    /// Pre-checks run before any layout: disabled template and empty
    /// item list are rejected up front. Logo failures degrade to a
    /// logo-less document.
    pub async fn render(
        &self,
        kind: DocumentKind,
        order: &Order,
        store: &StoreInfo,
    ) -> Result<PathBuf, RenderError> {
        if !kind.is_enabled(&self.flags) {
            return Err(RenderError::TemplateDisabled(kind.as_str()));
        }
        if order.items.is_empty() {
            return Err(RenderError::EmptyDocument);
        }

        let logo = match &store.logo {
            Some(source) => self.assets.resolve_logo(source).await,
            None => None,
        };

        tokio::fs::create_dir_all(&self.temp_dir).await?;
        let path = self.temp_dir.join(format!(
            "{}-{}-{}.pdf",
            kind.as_str(),
            order.order_number,
            uuid::Uuid::new_v4()
        ));

        build_pdf(&path, order, store, logo.as_deref())?;

        tracing::info!(
            order_id = %order.id,
            kind = %kind,
            path = %path.display(),
            "Receipt rendered"
        );
        Ok(path)
    }
}

fn build_pdf(
    path: &Path,
    order: &Order,
    store: &StoreInfo,
    logo: Option<&[u8]>,
) -> Result<(), RenderError> {
    let (doc, page, layer) = PdfDocument::new(
        format!("Comprobante {}", order.order_number),
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| RenderError::Pdf(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| RenderError::Pdf(e.to_string()))?;

    let layer = doc.get_page(page).get_layer(layer);
    let accent = store
        .accent_color
        .as_deref()
        .map(parse_accent_color)
        .unwrap_or(DEFAULT_ACCENT);

    let mut y = PAGE_HEIGHT_MM - MARGIN_MM;

    if let Some(bytes) = logo {
        match printpdf::image_crate::load_from_memory(bytes) {
            Ok(decoded) => {
                let image = printpdf::Image::from_dynamic_image(&decoded);
                image.add_to_layer(
                    layer.clone(),
                    printpdf::ImageTransform {
                        translate_x: Some(Mm(MARGIN_MM)),
                        translate_y: Some(Mm(y - 18.0)),
                        dpi: Some(300.0),
                        ..Default::default()
                    },
                );
                y -= 22.0;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Logo bytes are not a decodable image, skipping");
            }
        }
    }

    layer.set_fill_color(Color::Rgb(Rgb::new(accent.0, accent.1, accent.2, None)));
    text(&layer, &bold, 18.0, MARGIN_MM, y, &store.name);
    y -= LINE_HEIGHT_MM + 2.0;

    layer.set_fill_color(Color::Rgb(Rgb::new(0.3, 0.3, 0.3, None)));
    text(&layer, &regular, 9.0, MARGIN_MM, y, &format!("RUC: {}", store.ruc));
    y -= LINE_HEIGHT_MM - 1.5;
    text(&layer, &regular, 9.0, MARGIN_MM, y, &store.address);
    y -= LINE_HEIGHT_MM - 1.5;
    if let Some(phone) = &store.phone {
        text(&layer, &regular, 9.0, MARGIN_MM, y, &format!("Tel: {phone}"));
        y -= LINE_HEIGHT_MM - 1.5;
    }
    y -= LINE_HEIGHT_MM;

    layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
    text(
        &layer,
        &bold,
        12.0,
        MARGIN_MM,
        y,
        &format!("Pedido {}", order.order_number),
    );
    y -= LINE_HEIGHT_MM;
    text(
        &layer,
        &regular,
        10.0,
        MARGIN_MM,
        y,
        &format!("Fecha: {}", order.created_at.format("%d/%m/%Y %H:%M")),
    );
    y -= LINE_HEIGHT_MM;
    text(
        &layer,
        &regular,
        10.0,
        MARGIN_MM,
        y,
        &format!("Cliente: {} <{}>", order.customer_name, order.customer_email),
    );
    y -= LINE_HEIGHT_MM;

    let shipping_line = match order.shipping_method {
        ShippingMethod::Delivery => format!(
            "Entrega a domicilio: {}",
            order.shipping_address.as_deref().unwrap_or("-")
        ),
        ShippingMethod::Pickup => "Recojo en tienda".to_string(),
    };
    text(&layer, &regular, 10.0, MARGIN_MM, y, &shipping_line);
    y -= LINE_HEIGHT_MM * 2.0;

    // Item table header
    text(&layer, &bold, 10.0, MARGIN_MM, y, "Producto");
    text(&layer, &bold, 10.0, 120.0, y, "Cant.");
    text(&layer, &bold, 10.0, 145.0, y, "P. unit");
    text(&layer, &bold, 10.0, 170.0, y, "Importe");
    y -= LINE_HEIGHT_MM;

    for item in &order.items {
        text(&layer, &regular, 10.0, MARGIN_MM, y, &item.product_name);
        text(&layer, &regular, 10.0, 120.0, y, &item.quantity.to_string());
        text(&layer, &regular, 10.0, 145.0, y, &format!("{:.2}", item.unit_price));
        text(&layer, &regular, 10.0, 170.0, y, &format!("{:.2}", item.subtotal));
        y -= LINE_HEIGHT_MM;
    }

    y -= LINE_HEIGHT_MM;
    text(&layer, &regular, 10.0, 145.0, y, "Subtotal");
    text(&layer, &regular, 10.0, 170.0, y, &format!("{:.2}", order.subtotal));
    y -= LINE_HEIGHT_MM;
    text(&layer, &regular, 10.0, 145.0, y, "Envío");
    text(&layer, &regular, 10.0, 170.0, y, &format!("{:.2}", order.shipping_cost));
    y -= LINE_HEIGHT_MM;
    text(&layer, &bold, 11.0, 145.0, y, "Total S/");
    text(&layer, &bold, 11.0, 170.0, y, &format!("{:.2}", order.total));

    let file = File::create(path)?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| RenderError::Pdf(e.to_string()))?;
    Ok(())
}

fn text(layer: &PdfLayerReference, font: &IndirectFontRef, size: f32, x: f32, y: f32, value: &str) {
    layer.use_text(value, size, Mm(x), Mm(y), font);
}
