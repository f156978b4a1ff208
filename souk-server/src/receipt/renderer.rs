//! Receipt layout
//!
//! Turns a committed order into a paginated A4 PDF. Labels are Latin;
//! customer names, product names and addresses can be Hebrew or Arabic
//! and go through the bidi engine unchanged.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use souk_pdf::{DocConfig, FontConfig, ReceiptDoc, RenderResult};

use crate::db::models::Order;

const TITLE_SIZE: f32 = 16.0;
const BODY_SIZE: f32 = 10.0;
const HEADER_SIZE: f32 = 11.0;
const IMAGE_BOX_MM: f32 = 18.0;
const ROW_PAD_MM: f32 = 2.0;

/// Everything the renderer needs besides the output path
pub struct ReceiptContext<'a> {
    pub order: &'a Order,
    pub shop_name: &'a str,
    /// Downloaded images keyed by option id; missing entries get a
    /// placeholder frame
    pub images: &'a HashMap<String, PathBuf>,
    pub fonts: FontConfig,
}

/// Item table column layout, measured from the left content edge
struct Columns {
    name_x: f32,
    name_w: f32,
    qty_right: f32,
    unit_right: f32,
    total_right: f32,
}

impl Columns {
    fn new(doc: &ReceiptDoc) -> Self {
        let right = doc.x_right();
        Self {
            name_x: doc.x_left(),
            name_w: doc.content_width_mm() - 85.0,
            qty_right: right - 65.0,
            unit_right: right - 35.0,
            total_right: right,
        }
    }
}

/// Render the receipt PDF for an order
pub fn render_receipt(ctx: &ReceiptContext, out_path: &Path) -> RenderResult<()> {
    let order = ctx.order;
    let mut doc = ReceiptDoc::new(DocConfig::a4(
        format!("{} {}", ctx.shop_name, order.number),
        ctx.fonts.clone(),
    ))?;

    // Header
    doc.draw_paragraph(ctx.shop_name, TITLE_SIZE, doc.x_left(), doc.content_width_mm());
    doc.advance(1.0);
    doc.draw_rule(doc.x_left(), doc.x_right());
    doc.advance(4.0);

    // Order details block: Latin labels, bidi-capable values
    let details = [
        ("Order", order.number.clone()),
        ("Date", order.created_at.format("%Y-%m-%d %H:%M UTC").to_string()),
        ("Customer", order.customer.name.clone()),
        ("Email", order.customer.email.clone()),
        ("Phone", order.shipping_address.phone.clone()),
        (
            "Ship to",
            format!(
                "{}, {}, {}",
                order.shipping_address.full_name,
                order.shipping_address.street,
                order.shipping_address.city
            ),
        ),
        ("Payment", format!("{:?}", order.payment_method).to_lowercase()),
    ];
    let label_w = 30.0;
    for (label, value) in &details {
        let h = doc.measure_paragraph_mm(value, BODY_SIZE, doc.content_width_mm() - label_w);
        doc.ensure_space(h);
        let y = doc.cursor_mm();
        doc.draw_paragraph_at(label, BODY_SIZE, doc.x_left(), y, label_w);
        doc.draw_paragraph_at(
            value,
            BODY_SIZE,
            doc.x_left() + label_w,
            y,
            doc.content_width_mm() - label_w,
        );
        doc.advance(h);
    }
    doc.advance(4.0);

    // Item table
    let columns = Columns::new(&doc);
    draw_table_header(&mut doc, &columns);
    for item in &order.items {
        let image = item
            .image
            .as_ref()
            .and_then(|_| ctx.images.get(&item.option_id));
        let has_image_slot = item.image.is_some();

        let name = format!("{} - {}", item.product_name, item.option_name);
        let text_h = doc.measure_paragraph_mm(&name, BODY_SIZE, columns.name_w - image_indent(has_image_slot));
        let row_h = if has_image_slot {
            text_h.max(IMAGE_BOX_MM) + ROW_PAD_MM
        } else {
            text_h + ROW_PAD_MM
        };

        // Keep each row on one page; repeat the header after a break
        if doc.ensure_space(row_h + doc.line_height_mm(BODY_SIZE)) {
            draw_table_header(&mut doc, &columns);
        }

        let y = doc.cursor_mm();
        if has_image_slot {
            match image {
                Some(path) => doc.draw_image_file(path, columns.name_x, y, IMAGE_BOX_MM, IMAGE_BOX_MM),
                // Download failed earlier; the renderer still reserves the
                // slot so rows keep their shape
                None => doc.draw_image_file(
                    Path::new("/nonexistent"),
                    columns.name_x,
                    y,
                    IMAGE_BOX_MM,
                    IMAGE_BOX_MM,
                ),
            }
        }
        doc.draw_paragraph_at(
            &name,
            BODY_SIZE,
            columns.name_x + image_indent(has_image_slot),
            y,
            columns.name_w - image_indent(has_image_slot),
        );
        draw_right(&mut doc, &item.quantity.to_string(), BODY_SIZE, columns.qty_right, y);
        draw_right(&mut doc, &format!("{:.2}", item.unit_price), BODY_SIZE, columns.unit_right, y);
        draw_right(&mut doc, &format!("{:.2}", item.line_total()), BODY_SIZE, columns.total_right, y);
        doc.advance(row_h);
    }

    // Totals
    doc.advance(2.0);
    doc.draw_rule(columns.qty_right - 20.0, doc.x_right());
    doc.advance(2.0);
    let totals = [
        ("Subtotal", order.totals.subtotal),
        ("Shipping", order.totals.shipping),
        ("Grand total", order.totals.grand_total),
    ];
    for (label, amount) in totals {
        let h = doc.line_height_mm(BODY_SIZE);
        doc.ensure_space(h);
        let y = doc.cursor_mm();
        doc.draw_paragraph_at(label, BODY_SIZE, columns.qty_right - 20.0, y, 40.0);
        draw_right(&mut doc, &format!("{:.2}", amount), BODY_SIZE, columns.total_right, y);
        doc.advance(h);
    }

    doc.advance(6.0);
    doc.ensure_space(doc.line_height_mm(BODY_SIZE));
    doc.draw_paragraph(
        "תודה רבה! Thank you for your order.",
        BODY_SIZE,
        doc.x_left(),
        doc.content_width_mm(),
    );

    doc.finalize(out_path)
}

fn image_indent(has_image: bool) -> f32 {
    if has_image {
        IMAGE_BOX_MM + 3.0
    } else {
        0.0
    }
}

fn draw_table_header(doc: &mut ReceiptDoc, columns: &Columns) {
    doc.ensure_space(doc.line_height_mm(HEADER_SIZE) + 3.0);
    let y = doc.cursor_mm();
    doc.draw_paragraph_at("Item", HEADER_SIZE, columns.name_x, y, columns.name_w);
    draw_right(doc, "Qty", HEADER_SIZE, columns.qty_right, y);
    draw_right(doc, "Unit", HEADER_SIZE, columns.unit_right, y);
    draw_right(doc, "Total", HEADER_SIZE, columns.total_right, y);
    doc.advance(doc.line_height_mm(HEADER_SIZE) + 1.0);
    doc.draw_rule(columns.name_x, columns.total_right);
    doc.advance(2.0);
}

/// Right-align a short single-line value against `right_edge`
fn draw_right(doc: &mut ReceiptDoc, text: &str, size: f32, right_edge: f32, y: f32) {
    let w = doc.measure_text_mm(text, size) + 0.5;
    doc.draw_paragraph_at(text, size, right_edge - w, y, w);
}
