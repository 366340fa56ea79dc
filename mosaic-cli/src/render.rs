//! PNG and SVG renderings of a finished mosaic.

use image::RgbImage;
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;
use svg::node::element::{Polygon, Rectangle};
use svg::Document;

use mosaic_core::{Cell, Mosaic, OutlineStyle};

/// Polygon on the pixel grid, or `None` if rounding collapses it.
fn pixel_polygon(cell: &Cell) -> Option<Vec<Point<i32>>> {
    let mut points: Vec<Point<i32>> = cell
        .vertices
        .iter()
        .map(|v| Point::new(v.x.round() as i32, v.y.round() as i32))
        .collect();
    points.dedup();
    // draw_polygon_mut rejects an explicitly closed ring
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    (points.len() >= 3).then_some(points)
}

/// Fill every cell with its average color on a black canvas.
pub fn rasterize(mosaic: &Mosaic) -> RgbImage {
    let mut canvas = RgbImage::new(mosaic.width, mosaic.height);
    for cell in &mosaic.cells {
        if let Some(points) = pixel_polygon(cell) {
            draw_polygon_mut(&mut canvas, &points, image::Rgb(cell.color));
        }
    }
    canvas
}

/// SVG `points` attribute: `x0,y0 x1,y1 ...`
fn points_attr(cell: &Cell) -> String {
    cell.vertices
        .iter()
        .map(|v| format!("{},{}", v.x, v.y))
        .collect::<Vec<_>>()
        .join(" ")
}

fn stroke_color(style: &OutlineStyle) -> String {
    let g = style.gray;
    format!("#{g:02x}{g:02x}{g:02x}")
}

/// SVG document with one `<polygon>` per cell.
///
/// When the mosaic carries outline styles, each polygon is stroked with its
/// cell's edge-driven gray and width.
pub fn to_svg(mosaic: &Mosaic) -> String {
    let (w, h) = (mosaic.width, mosaic.height);
    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h))
        .add(
            Rectangle::new()
                .set("width", w)
                .set("height", h)
                .set("fill", "#000000"),
        );

    for (i, cell) in mosaic.cells.iter().enumerate() {
        let mut polygon = Polygon::new()
            .set("points", points_attr(cell))
            .set("fill", cell.fill());
        match mosaic.outlines.get(i).copied().flatten() {
            Some(style) => {
                polygon = polygon
                    .set("stroke", stroke_color(&style))
                    .set("stroke-width", style.width)
                    .set("stroke-linejoin", "round");
            }
            None => polygon = polygon.set("stroke", "none"),
        }
        doc = doc.add(polygon);
    }

    doc.to_string()
}
