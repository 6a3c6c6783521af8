//! Renders a maintenance receipt as a single A4 page.

use std::io::BufWriter;

use printpdf::{BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point};

use crate::{Error, receipt::Receipt};

/// The letterhead printed at the top of every receipt.
#[derive(Debug, Clone, PartialEq)]
pub struct Society {
    /// The society's name, printed as the heading.
    pub name: String,
    /// A single line postal address.
    pub address: String,
}

const LEFT: f32 = 20.0;
const RIGHT: f32 = 190.0;
const SECOND_COLUMN: f32 = 110.0;

/// Render `receipt` as a PDF document and return its bytes.
///
/// The built-in PDF fonts cannot draw the rupee sign, so amounts are
/// prefixed with "Rs.".
pub fn render_receipt_pdf(receipt: &Receipt, society: &Society) -> Result<Vec<u8>, Error> {
    let (doc, page, layer) = PdfDocument::new(
        format!("Receipt {}", receipt.receipt_id),
        Mm(210.0),
        Mm(297.0),
        "Layer 1",
    );
    let layer = doc.get_page(page).get_layer(layer);

    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|error| Error::RenderError(error.to_string()))?;
    let font_bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|error| Error::RenderError(error.to_string()))?;

    let mut y = 275.0;
    layer.use_text(&society.name, 20.0, Mm(LEFT), Mm(y), &font_bold);
    y -= 8.0;
    layer.use_text(&society.address, 10.0, Mm(LEFT), Mm(y), &font);
    y -= 10.0;
    layer.use_text("Maintenance Receipt", 14.0, Mm(LEFT), Mm(y), &font_bold);

    y -= 5.0;
    horizontal_rule(&layer, y);

    let date = receipt.date.to_string();
    let amount = format!("Rs. {:.2}", receipt.amount);
    let rows = [
        [("Receipt ID", receipt.receipt_id.as_str()), ("Date", date.as_str())],
        [("Flat No", receipt.flat_no.as_str()), ("Owner", receipt.name.as_str())],
        [("Month", receipt.month.as_str()), ("Mode", receipt.mode.as_str())],
        [("Txn / Ref", receipt.txn_id.as_str()), ("Amount", amount.as_str())],
    ];

    y -= 10.0;
    for [left, right] in rows {
        field(&layer, &font_bold, &font, left, LEFT, y);
        field(&layer, &font_bold, &font, right, SECOND_COLUMN, y);
        y -= 8.0;
    }

    y -= 4.0;
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(LEFT), Mm(y)), false),
            (Point::new(Mm(RIGHT), Mm(y)), false),
            (Point::new(Mm(RIGHT), Mm(y - 12.0)), false),
            (Point::new(Mm(LEFT), Mm(y - 12.0)), false),
        ],
        is_closed: true,
    });
    layer.use_text(
        "Received with thanks towards monthly maintenance.",
        11.0,
        Mm(LEFT + 5.0),
        Mm(y - 7.5),
        &font,
    );

    y -= 22.0;
    layer.use_text(
        "This is a system generated receipt. No signature required.",
        9.0,
        Mm(LEFT),
        Mm(y),
        &font,
    );

    let mut writer = BufWriter::new(Vec::<u8>::new());
    doc.save(&mut writer)
        .map_err(|error| Error::RenderError(error.to_string()))?;

    writer
        .into_inner()
        .map_err(|error| Error::RenderError(error.to_string()))
}

fn field(
    layer: &PdfLayerReference,
    label_font: &IndirectFontRef,
    value_font: &IndirectFontRef,
    (label, value): (&str, &str),
    x: f32,
    y: f32,
) {
    layer.use_text(format!("{label}:"), 11.0, Mm(x), Mm(y), label_font);
    layer.use_text(value, 11.0, Mm(x + 25.0), Mm(y), value_font);
}

fn horizontal_rule(layer: &PdfLayerReference, y: f32) {
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(LEFT), Mm(y)), false),
            (Point::new(Mm(RIGHT), Mm(y)), false),
        ],
        is_closed: false,
    });
}
