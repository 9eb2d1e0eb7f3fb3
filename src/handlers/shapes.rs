//! ASCII-art generators for the `circle?` and `triangle?` endpoints.
//!
//! Rows end with `<br>` so the art survives being rendered as HTML.

use crate::limits::ShapeLimits;
use std::fmt::Write;

/// Draws a filled circle of the given radius.
///
/// Row `i` and column `j` both run over `-radius..=radius`; a cell is `*`
/// when `i² + j² <= radius²` and a space otherwise. A negative radius draws
/// nothing.
///
/// ```
/// use fun_web::handlers::shapes::draw_circle;
///
/// assert_eq!(draw_circle(1), " * <br>***<br> * <br>");
/// assert_eq!(draw_circle(0), "*<br>");
/// assert_eq!(draw_circle(-1), "");
/// ```
pub fn draw_circle(radius: i32) -> String {
    if radius < 0 {
        return String::new();
    }

    let r = i64::from(radius);
    let side = (2 * r + 1) as usize;
    let mut out = String::with_capacity(side * (side + 4));

    for i in -r..=r {
        for j in -r..=r {
            out.push(if i * i + j * j <= r * r { '*' } else { ' ' });
        }
        out.push_str("<br>");
    }

    out
}

/// Draws a left-aligned right triangle: row `i` holds `i + 1` stars.
///
/// A side of zero or less draws nothing.
///
/// ```
/// use fun_web::handlers::shapes::draw_triangle;
///
/// assert_eq!(draw_triangle(3), "*<br>**<br>***<br>");
/// assert_eq!(draw_triangle(0), "");
/// ```
pub fn draw_triangle(side: i32) -> String {
    let Ok(side) = usize::try_from(side) else {
        return String::new();
    };

    let mut out = String::with_capacity(side * (side + 9) / 2);
    for row in 1..=side {
        out.extend(std::iter::repeat('*').take(row));
        out.push_str("<br>");
    }

    out
}

/// Renders `how_many` shapes whose size starts at `size` and shrinks by one
/// each time, every drawing followed by `\n`.
///
/// Both inputs are clamped to `limits` first. A non-positive `how_many`
/// renders nothing.
pub fn render_series(
    draw: fn(i32) -> String,
    how_many: i32,
    size: i32,
    limits: &ShapeLimits,
) -> String {
    let how_many = how_many.min(limits.max_count);
    let size = size.min(limits.max_size);

    let mut out = String::new();
    for step in 0..how_many.max(0) {
        let _ = writeln!(out, "{}", draw(size.saturating_sub(step)));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_rows() {
        let circle = draw_circle(2);
        let rows: Vec<&str> = circle.split_terminator("<br>").collect();

        assert_eq!(rows, ["  *  ", " *** ", "*****", " *** ", "  *  "]);
    }

    #[test]
    fn circle_is_square() {
        for radius in [0, 1, 5, 17] {
            let circle = draw_circle(radius);
            let side = (2 * radius + 1) as usize;

            assert_eq!(circle.matches("<br>").count(), side);
            assert!(circle.split_terminator("<br>").all(|row| row.len() == side));
        }
    }

    #[test]
    fn triangle_rows() {
        assert_eq!(draw_triangle(1), "*<br>");
        assert_eq!(draw_triangle(-4), "");
        assert_eq!(
            draw_triangle(5).split_terminator("<br>").last(),
            Some("*****")
        );
    }

    #[test]
    fn series_shrinks() {
        let limits = ShapeLimits::default();

        assert_eq!(
            render_series(draw_triangle, 2, 3, &limits),
            "*<br>**<br>***<br>\n*<br>**<br>\n"
        );
        assert_eq!(
            render_series(draw_circle, 3, 5, &limits),
            format!("{}\n{}\n{}\n", draw_circle(5), draw_circle(4), draw_circle(3))
        );
    }

    #[test]
    fn series_past_zero() {
        let limits = ShapeLimits::default();

        // Sizes 1, 0, -1: the last drawing is empty but still terminated
        assert_eq!(
            render_series(draw_triangle, 3, 1, &limits),
            "*<br>\n\n\n"
        );
        assert_eq!(render_series(draw_circle, 0, 5, &limits), "");
        assert_eq!(render_series(draw_circle, -3, 5, &limits), "");
        assert_eq!(
            render_series(draw_circle, 2, i32::MIN, &limits),
            "\n\n"
        );
    }

    #[test]
    fn series_is_clamped() {
        let limits = ShapeLimits {
            max_count: 2,
            max_size: 3,
        };

        assert_eq!(
            render_series(draw_triangle, 100, 100, &limits),
            render_series(draw_triangle, 2, 3, &ShapeLimits::default())
        );
    }
}
