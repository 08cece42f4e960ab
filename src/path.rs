use crate::types::{Point, Segment, signed_area};
use std::fmt::Write;

pub const DEFAULT_CURVE_SEGMENTS: u32 = 24;
pub const DEFAULT_ARC_SEGMENTS: u32 = 36;

/// Straight-line shortcut for nearly flat Béziers.
///
/// A curve whose control points all lie within
/// `max(epsilon, chord_length * chord_fraction)` of its chord is emitted as a
/// single line to its endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlattenTolerance {
    pub epsilon: f32,
    pub chord_fraction: f32,
}

impl Default for FlattenTolerance {
    fn default() -> Self {
        Self {
            epsilon: 0.01,
            chord_fraction: 0.001,
        }
    }
}

impl FlattenTolerance {
    fn limit(&self, chord: f32) -> f32 {
        self.epsilon.max(chord * self.chord_fraction)
    }
}

/// Uniform downscale for documents authored in huge units without any
/// transform or viewBox to bring them back into range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateRescale {
    pub threshold: f32,
    pub factor: f32,
}

impl Default for CoordinateRescale {
    fn default() -> Self {
        Self {
            threshold: 10_000.0,
            factor: 0.01,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathConfig {
    pub curve_segments: u32,
    pub arc_segments: u32,
    pub flatten: Option<FlattenTolerance>,
    pub rescale: Option<CoordinateRescale>,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            curve_segments: DEFAULT_CURVE_SEGMENTS,
            arc_segments: DEFAULT_ARC_SEGMENTS,
            flatten: Some(FlattenTolerance::default()),
            rescale: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathCommand {
    pub letter: char,
    pub params: Vec<f32>,
}

/// Converts SVG path data into flattened, winding-normalized polylines.
/// Never fails: malformed input yields whatever could be salvaged.
pub fn convert_path(d: &str, config: &PathConfig) -> Vec<Segment> {
    convert_path_in_context(d, config, false)
}

/// Same as [`convert_path`], but the large-coordinate rescale is suppressed
/// when the surrounding document already supplies a transform or viewBox.
pub(crate) fn convert_path_in_context(
    d: &str,
    config: &PathConfig,
    has_document_context: bool,
) -> Vec<Segment> {
    let sanitized = sanitize_path_data(d);
    let commands = tokenize_path_data(&sanitized);

    let mut flattener = Flattener::new(config);
    for command in &commands {
        flattener.run(command);
    }
    let mut segments = flattener.finish();

    if let Some(rescale) = config.rescale {
        if !has_document_context && exceeds_threshold(&segments, rescale.threshold) {
            for segment in &mut segments {
                for p in &mut segment.points {
                    p.x *= rescale.factor;
                    p.y *= rescale.factor;
                }
            }
        }
    }

    for segment in &mut segments {
        segment.dedup_consecutive();
    }
    segments.retain(|s| !s.points.is_empty());
    normalize_winding(&mut segments);
    segments
}

fn exceeds_threshold(segments: &[Segment], threshold: f32) -> bool {
    segments
        .iter()
        .flat_map(|s| s.points.iter())
        .any(|p| p.x.abs() > threshold || p.y.abs() > threshold)
}

/// Normalizes separators: commas become spaces, command letters are padded,
/// a space is inserted before a sign that starts a new number, and runs of
/// whitespace collapse to one space.
pub fn sanitize_path_data(d: &str) -> String {
    let chars: Vec<char> = d.chars().collect();
    let mut out = String::with_capacity(d.len() + 16);

    for (i, &ch) in chars.iter().enumerate() {
        let prev = if i > 0 { Some(chars[i - 1]) } else { None };
        match ch {
            ',' => out.push(' '),
            c if c.is_whitespace() => out.push(' '),
            '+' | '-' => {
                let after_exponent = i > 0 && is_exponent_marker(&chars, i - 1);
                if !after_exponent && prev.is_some_and(|p| p.is_ascii_digit() || p == '.') {
                    out.push(' ');
                }
                out.push(ch);
            }
            c if c.is_ascii_alphabetic() => {
                if is_exponent_marker(&chars, i) {
                    out.push(c);
                } else {
                    out.push(' ');
                    out.push(c);
                    out.push(' ');
                }
            }
            _ => out.push(ch),
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

// `e`/`E` inside a number: preceded by a mantissa digit or dot and followed by
// a digit, optionally after a sign.
fn is_exponent_marker(chars: &[char], i: usize) -> bool {
    if !matches!(chars[i], 'e' | 'E') || i == 0 {
        return false;
    }
    let prev = chars[i - 1];
    if !(prev.is_ascii_digit() || prev == '.') {
        return false;
    }
    match chars.get(i + 1) {
        Some(c) if c.is_ascii_digit() => true,
        Some('+' | '-') => chars.get(i + 2).is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    }
}

/// Splits path data into commands with their raw parameters. Case is kept.
/// Numbers that appear before any command letter, and bytes that are neither
/// numbers nor letters, are dropped.
pub fn tokenize_path_data(d: &str) -> Vec<PathCommand> {
    let mut scanner = PathScanner::new(d);
    let mut out = Vec::new();

    loop {
        scanner.skip_separators();
        let Some(b) = scanner.peek() else { break };
        if b.is_ascii_alphabetic() {
            scanner.bump();
            let letter = b as char;
            let params = if matches!(letter, 'A' | 'a') {
                scanner.arc_params()
            } else {
                scanner.numbers()
            };
            out.push(PathCommand { letter, params });
        } else if scanner.next_number().is_none() {
            scanner.bump();
        }
    }

    out
}

struct PathScanner<'a> {
    bytes: &'a [u8],
    i: usize,
}

impl<'a> PathScanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            bytes: input.as_bytes(),
            i: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.i).copied()
    }

    fn bump(&mut self) {
        self.i += 1;
    }

    fn skip_separators(&mut self) {
        while let Some(b) = self.peek() {
            if matches!(b, b' ' | b'\n' | b'\r' | b'\t' | b',') {
                self.i += 1;
            } else {
                break;
            }
        }
    }

    fn numbers(&mut self) -> Vec<f32> {
        let mut out = Vec::new();
        while let Some(v) = self.next_number() {
            out.push(v);
        }
        out
    }

    // rx ry rotation large-arc sweep x y, repeated; flags are single characters.
    fn arc_params(&mut self) -> Vec<f32> {
        let mut out = Vec::new();
        loop {
            let next = match out.len() % 7 {
                3 | 4 => self.next_flag(),
                _ => self.next_number(),
            };
            match next {
                Some(v) => out.push(v),
                None => break,
            }
        }
        out
    }

    fn digits(&mut self) -> bool {
        let start = self.i;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.i += 1;
        }
        self.i > start
    }

    fn next_number(&mut self) -> Option<f32> {
        self.skip_separators();
        let start = self.i;

        if matches!(self.peek(), Some(b'+' | b'-')) {
            self.i += 1;
        }
        let mut has = self.digits();
        if self.peek() == Some(b'.') {
            self.i += 1;
            has |= self.digits();
        }
        if !has {
            self.i = start;
            return None;
        }

        if matches!(self.peek(), Some(b'e' | b'E')) {
            let mark = self.i;
            self.i += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.i += 1;
            }
            if !self.digits() {
                self.i = mark;
            }
        }

        let s = std::str::from_utf8(&self.bytes[start..self.i]).ok()?;
        s.parse::<f32>().ok()
    }

    fn next_flag(&mut self) -> Option<f32> {
        self.skip_separators();
        match self.peek()? {
            b'0' => {
                self.i += 1;
                Some(0.0)
            }
            b'1' => {
                self.i += 1;
                Some(1.0)
            }
            _ => self
                .next_number()
                .map(|v| if v.abs() > 0.5 { 1.0 } else { 0.0 }),
        }
    }
}

fn arity(command: char) -> Option<usize> {
    match command {
        'M' | 'L' | 'T' => Some(2),
        'H' | 'V' => Some(1),
        'C' => Some(6),
        'S' | 'Q' => Some(4),
        'A' => Some(7),
        'Z' => Some(0),
        _ => None,
    }
}

type Xy = (f32, f32);

struct Flattener<'a> {
    config: &'a PathConfig,
    current: Xy,
    start: Xy,
    cubic_ctrl: Option<Xy>,
    quad_ctrl: Option<Xy>,
    points: Vec<Point>,
    drawn: bool,
    out: Vec<Segment>,
}

impl<'a> Flattener<'a> {
    fn new(config: &'a PathConfig) -> Self {
        Self {
            config,
            current: (0.0, 0.0),
            start: (0.0, 0.0),
            cubic_ctrl: None,
            quad_ctrl: None,
            points: Vec::new(),
            drawn: false,
            out: Vec::new(),
        }
    }

    fn run(&mut self, command: &PathCommand) {
        let upper = command.letter.to_ascii_uppercase();
        let relative = command.letter.is_ascii_lowercase();
        let Some(arity) = arity(upper) else { return };

        if upper == 'Z' {
            self.close();
            return;
        }

        for (i, p) in command.params.chunks_exact(arity).enumerate() {
            if p.iter().any(|v| !v.is_finite()) {
                continue;
            }
            let (bx, by) = if relative { self.current } else { (0.0, 0.0) };
            match upper {
                'M' => {
                    let target = (bx + p[0], by + p[1]);
                    if !finite(&[target]) {
                        continue;
                    }
                    if i == 0 {
                        self.move_to(target);
                    } else {
                        self.line_to(target);
                    }
                    self.clear_controls();
                }
                'L' | 'H' | 'V' => {
                    let target = match upper {
                        'L' => (bx + p[0], by + p[1]),
                        'H' => (bx + p[0], self.current.1),
                        _ => (self.current.0, by + p[0]),
                    };
                    if !finite(&[target]) {
                        continue;
                    }
                    self.line_to(target);
                    self.clear_controls();
                }
                'C' => {
                    let c1 = (bx + p[0], by + p[1]);
                    let c2 = (bx + p[2], by + p[3]);
                    let end = (bx + p[4], by + p[5]);
                    if !finite(&[c1, c2, end]) {
                        continue;
                    }
                    self.cubic_to(c1, c2, end);
                    self.cubic_ctrl = Some(c2);
                    self.quad_ctrl = None;
                }
                'S' => {
                    let c1 = reflect(self.cubic_ctrl, self.current);
                    let c2 = (bx + p[0], by + p[1]);
                    let end = (bx + p[2], by + p[3]);
                    if !finite(&[c1, c2, end]) {
                        continue;
                    }
                    self.cubic_to(c1, c2, end);
                    self.cubic_ctrl = Some(c2);
                    self.quad_ctrl = None;
                }
                'Q' => {
                    let c = (bx + p[0], by + p[1]);
                    let end = (bx + p[2], by + p[3]);
                    if !finite(&[c, end]) {
                        continue;
                    }
                    self.quad_to(c, end);
                    self.quad_ctrl = Some(c);
                    self.cubic_ctrl = None;
                }
                'T' => {
                    let c = reflect(self.quad_ctrl, self.current);
                    let end = (bx + p[0], by + p[1]);
                    if !finite(&[c, end]) {
                        continue;
                    }
                    self.quad_to(c, end);
                    self.quad_ctrl = Some(c);
                    self.cubic_ctrl = None;
                }
                'A' => {
                    let end = (bx + p[5], by + p[6]);
                    if !finite(&[end]) {
                        continue;
                    }
                    self.arc_to(p[0], p[1], p[2], p[3] != 0.0, p[4] != 0.0, end);
                    self.clear_controls();
                }
                _ => {}
            }
        }
    }

    fn clear_controls(&mut self) {
        self.cubic_ctrl = None;
        self.quad_ctrl = None;
    }

    fn move_to(&mut self, p: Xy) {
        self.flush(false);
        self.current = p;
        self.start = p;
        self.points.push(Point::new(p.0, p.1));
    }

    // Drawing after Z without a new M restarts at the previous subpath start.
    fn ensure_started(&mut self) {
        if self.points.is_empty() {
            self.points.push(Point::new(self.current.0, self.current.1));
        }
        self.drawn = true;
    }

    // Samples between finite endpoints can still overflow.
    fn push(&mut self, p: Xy) {
        if finite(&[p]) {
            self.points.push(Point::new(p.0, p.1));
        }
    }

    fn line_to(&mut self, p: Xy) {
        self.ensure_started();
        self.push(p);
        self.current = p;
    }

    fn close(&mut self) {
        self.clear_controls();
        if !self.points.is_empty() && self.drawn {
            let start = Point::new(self.start.0, self.start.1);
            if let Some(last) = self.points.last() {
                if !last.coincident(start) {
                    self.points.push(start);
                }
            }
            self.flush(true);
        }
        self.current = self.start;
    }

    fn flush(&mut self, closed: bool) {
        let points = std::mem::take(&mut self.points);
        if self.drawn && !points.is_empty() {
            self.out.push(Segment::new(points, closed));
        }
        self.drawn = false;
    }

    fn finish(mut self) -> Vec<Segment> {
        self.flush(false);
        self.out
    }

    fn is_flat(&self, p0: Xy, controls: &[Xy], end: Xy) -> bool {
        let Some(tolerance) = self.config.flatten else {
            return false;
        };
        let chord = distance(p0, end);
        let limit = tolerance.limit(chord);
        controls
            .iter()
            .all(|&c| distance_to_segment(c, p0, end) <= limit)
    }

    fn cubic_to(&mut self, c1: Xy, c2: Xy, end: Xy) {
        let p0 = self.current;
        if self.is_flat(p0, &[c1, c2], end) {
            self.line_to(end);
            return;
        }
        self.ensure_started();
        let n = self.config.curve_segments.max(1);
        for i in 1..n {
            let t = i as f32 / n as f32;
            self.push(cubic_point(p0, c1, c2, end, t));
        }
        self.line_to(end);
    }

    fn quad_to(&mut self, c: Xy, end: Xy) {
        let p0 = self.current;
        if self.is_flat(p0, &[c], end) {
            self.line_to(end);
            return;
        }
        self.ensure_started();
        let n = self.config.curve_segments.max(1);
        for i in 1..n {
            let t = i as f32 / n as f32;
            self.push(quad_point(p0, c, end, t));
        }
        self.line_to(end);
    }

    fn arc_to(&mut self, rx: f32, ry: f32, rotation_deg: f32, large_arc: bool, sweep: bool, end: Xy) {
        let p0 = self.current;
        match arc_center(p0, rx, ry, rotation_deg, large_arc, sweep, end) {
            Some(arc) => {
                self.ensure_started();
                let n = self.config.arc_segments.max(1);
                for i in 1..n {
                    let theta = arc.theta1 + arc.dtheta * (i as f32 / n as f32);
                    self.push(arc.point_at(theta));
                }
                self.line_to(end);
            }
            None => self.line_to(end),
        }
    }
}

fn finite(points: &[Xy]) -> bool {
    points.iter().all(|p| p.0.is_finite() && p.1.is_finite())
}

fn reflect(ctrl: Option<Xy>, current: Xy) -> Xy {
    match ctrl {
        Some((x, y)) => (2.0 * current.0 - x, 2.0 * current.1 - y),
        None => current,
    }
}

fn cubic_point(p0: Xy, c1: Xy, c2: Xy, p3: Xy, t: f32) -> Xy {
    let mt = 1.0 - t;
    let w0 = mt * mt * mt;
    let w1 = 3.0 * mt * mt * t;
    let w2 = 3.0 * mt * t * t;
    let w3 = t * t * t;
    (
        w0 * p0.0 + w1 * c1.0 + w2 * c2.0 + w3 * p3.0,
        w0 * p0.1 + w1 * c1.1 + w2 * c2.1 + w3 * p3.1,
    )
}

fn quad_point(p0: Xy, c: Xy, p2: Xy, t: f32) -> Xy {
    let mt = 1.0 - t;
    let w0 = mt * mt;
    let w1 = 2.0 * mt * t;
    let w2 = t * t;
    (
        w0 * p0.0 + w1 * c.0 + w2 * p2.0,
        w0 * p0.1 + w1 * c.1 + w2 * p2.1,
    )
}

fn distance(a: Xy, b: Xy) -> f32 {
    libm::hypotf(b.0 - a.0, b.1 - a.1)
}

fn distance_to_segment(p: Xy, a: Xy, b: Xy) -> f32 {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f32::EPSILON {
        return distance(p, a);
    }
    let t = (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_sq).clamp(0.0, 1.0);
    distance(p, (a.0 + t * dx, a.1 + t * dy))
}

struct ArcCenter {
    cx: f32,
    cy: f32,
    rx: f32,
    ry: f32,
    sin_phi: f32,
    cos_phi: f32,
    theta1: f32,
    dtheta: f32,
}

impl ArcCenter {
    fn point_at(&self, theta: f32) -> Xy {
        let x = self.rx * libm::cosf(theta);
        let y = self.ry * libm::sinf(theta);
        (
            self.cx + self.cos_phi * x - self.sin_phi * y,
            self.cy + self.sin_phi * x + self.cos_phi * y,
        )
    }
}

// Endpoint to center parameterization (SVG 1.1 implementation notes, F.6.5).
// None means the arc degenerates to a straight line.
fn arc_center(
    p0: Xy,
    rx_in: f32,
    ry_in: f32,
    rotation_deg: f32,
    large_arc: bool,
    sweep: bool,
    p1: Xy,
) -> Option<ArcCenter> {
    use std::f32::consts::PI;

    let (x0, y0) = p0;
    let (x1, y1) = p1;
    let mut rx = rx_in.abs();
    let mut ry = ry_in.abs();
    if rx == 0.0 || ry == 0.0 || (x0 == x1 && y0 == y1) {
        return None;
    }

    let phi = rotation_deg.to_radians();
    let sin_phi = libm::sinf(phi);
    let cos_phi = libm::cosf(phi);

    let dx2 = (x0 - x1) / 2.0;
    let dy2 = (y0 - y1) / 2.0;
    let x1p = cos_phi * dx2 + sin_phi * dy2;
    let y1p = -sin_phi * dx2 + cos_phi * dy2;

    let x1p2 = x1p * x1p;
    let y1p2 = y1p * y1p;
    let lambda = x1p2 / (rx * rx) + y1p2 / (ry * ry);
    if lambda > 1.0 {
        let s = libm::sqrtf(lambda);
        rx *= s;
        ry *= s;
    }

    let rx2 = rx * rx;
    let ry2 = ry * ry;
    let num = rx2 * ry2 - rx2 * y1p2 - ry2 * x1p2;
    let den = rx2 * y1p2 + ry2 * x1p2;
    let mut coef = 0.0;
    if den != 0.0 {
        let sign = if large_arc == sweep { -1.0 } else { 1.0 };
        coef = sign * libm::sqrtf((num / den).max(0.0));
    }
    let cxp = coef * (rx * y1p / ry);
    let cyp = coef * (-ry * x1p / rx);

    let cx = cos_phi * cxp - sin_phi * cyp + (x0 + x1) / 2.0;
    let cy = sin_phi * cxp + cos_phi * cyp + (y0 + y1) / 2.0;

    fn angle(ux: f32, uy: f32, vx: f32, vy: f32) -> f32 {
        libm::atan2f(ux * vy - uy * vx, ux * vx + uy * vy)
    }

    let ux = (x1p - cxp) / rx;
    let uy = (y1p - cyp) / ry;
    let vx = (-x1p - cxp) / rx;
    let vy = (-y1p - cyp) / ry;

    let theta1 = angle(1.0, 0.0, ux, uy);
    let mut dtheta = angle(ux, uy, vx, vy);
    if !sweep && dtheta > 0.0 {
        dtheta -= 2.0 * PI;
    } else if sweep && dtheta < 0.0 {
        dtheta += 2.0 * PI;
    }

    let arc = ArcCenter {
        cx,
        cy,
        rx,
        ry,
        sin_phi,
        cos_phi,
        theta1,
        dtheta,
    };
    [arc.cx, arc.cy, arc.rx, arc.ry, arc.theta1, arc.dtheta]
        .iter()
        .all(|v| v.is_finite())
        .then_some(arc)
}

/// Forces the outer contour (largest absolute area among closed subpaths) to
/// positive signed area and every other closed subpath to negative area.
/// Open subpaths are left alone.
pub fn normalize_winding(segments: &mut [Segment]) {
    let areas: Vec<Option<f64>> = segments
        .iter()
        .map(|s| (s.closed && s.points.len() >= 3).then(|| signed_area(&s.points)))
        .collect();

    let outer = areas
        .iter()
        .enumerate()
        .filter_map(|(i, a)| a.map(|a| (i, a.abs())))
        .fold(None::<(usize, f64)>, |best, (i, a)| match best {
            Some((_, best_area)) if best_area >= a => best,
            _ => Some((i, a)),
        })
        .map(|(i, _)| i);

    for (i, area) in areas.into_iter().enumerate() {
        let Some(area) = area else { continue };
        if area == 0.0 {
            continue;
        }
        let want_positive = Some(i) == outer;
        if (area > 0.0) != want_positive {
            segments[i].reverse();
        }
    }
}

/// Serializes segments back to absolute `M … L … Z` path data.
pub fn segments_to_path_data(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        for (i, p) in segment.points.iter().enumerate() {
            if !out.is_empty() {
                out.push(' ');
            }
            let cmd = if i == 0 { 'M' } else { 'L' };
            let _ = write!(&mut out, "{} {} {}", cmd, p.x, p.y);
        }
        if segment.closed && !segment.points.is_empty() {
            out.push_str(" Z");
        }
    }
    out
}
