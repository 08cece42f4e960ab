/// Affine transform `(a, b, c, d, e, f)` in SVG column order:
/// `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn translate(tx: f32, ty: f32) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    pub fn rotate(deg: f32) -> Self {
        let rad = deg.to_radians();
        let s = libm::sinf(rad);
        let c = libm::cosf(rad);
        Self {
            a: c,
            b: s,
            c: -s,
            d: c,
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn skew_x(deg: f32) -> Self {
        Self {
            c: libm::tanf(deg.to_radians()),
            ..Self::IDENTITY
        }
    }

    pub fn skew_y(deg: f32) -> Self {
        Self {
            b: libm::tanf(deg.to_radians()),
            ..Self::IDENTITY
        }
    }

    /// `[self] * [other]`: the result applies `other` first, then `self`.
    pub fn mul(self, other: Self) -> Self {
        Self {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn apply(self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Applies rotation/scale/skew only.
    pub fn apply_linear(self, x: f32, y: f32) -> (f32, f32) {
        (self.a * x + self.c * y, self.b * x + self.d * y)
    }

    pub fn translation(self) -> (f32, f32) {
        (self.e, self.f)
    }

    pub fn is_identity(self) -> bool {
        self == Self::IDENTITY
    }

    pub fn determinant(self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    // Area scale -> sqrt(|det|); used to scale stroke widths.
    pub fn scale_factor(self) -> f32 {
        libm::sqrtf(self.determinant().abs()).max(0.0)
    }

    /// Rotation of the x axis, in radians.
    pub fn rotation(self) -> f32 {
        libm::atan2f(self.b, self.a)
    }

    pub fn x_scale(self) -> f32 {
        libm::hypotf(self.a, self.b)
    }

    pub fn y_scale(self) -> f32 {
        libm::hypotf(self.c, self.d)
    }

    pub fn is_finite(self) -> bool {
        [self.a, self.b, self.c, self.d, self.e, self.f]
            .iter()
            .all(|v| v.is_finite())
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Composes an element's own transform with the matrix inherited from its
/// ancestors. Local coordinates go through the element's transform first and
/// the inherited chain after it, as nested SVG groups do.
pub fn compose(local: Matrix, inherited: Matrix) -> Matrix {
    inherited.mul(local)
}

/// Parses an SVG transform list. Within one list the rightmost function is
/// applied first, as SVG specifies. Unknown functions are ignored and a
/// malformed tail stops parsing.
pub fn parse_transform(input: &str) -> Matrix {
    let mut out = Matrix::IDENTITY;
    let mut s = input.trim();

    while !s.is_empty() {
        let Some(open) = s.find('(') else { break };
        let name = s[..open]
            .trim()
            .trim_start_matches(',')
            .trim()
            .to_ascii_lowercase();
        let Some(close) = s[open + 1..].find(')') else {
            break;
        };
        let args = parse_number_list(&s[open + 1..open + 1 + close]);

        let m = match name.as_str() {
            "translate" => {
                let tx = args.first().copied().unwrap_or(0.0);
                let ty = args.get(1).copied().unwrap_or(0.0);
                Matrix::translate(tx, ty)
            }
            "scale" => {
                let sx = args.first().copied().unwrap_or(1.0);
                let sy = args.get(1).copied().unwrap_or(sx);
                Matrix::scale(sx, sy)
            }
            "rotate" => {
                let a = args.first().copied().unwrap_or(0.0);
                if args.len() >= 3 {
                    let (cx, cy) = (args[1], args[2]);
                    Matrix::translate(cx, cy)
                        .mul(Matrix::rotate(a))
                        .mul(Matrix::translate(-cx, -cy))
                } else {
                    Matrix::rotate(a)
                }
            }
            "skewx" => Matrix::skew_x(args.first().copied().unwrap_or(0.0)),
            "skewy" => Matrix::skew_y(args.first().copied().unwrap_or(0.0)),
            "matrix" if args.len() >= 6 => {
                Matrix::new(args[0], args[1], args[2], args[3], args[4], args[5])
            }
            _ => Matrix::IDENTITY,
        };

        out = out.mul(m);
        s = s[open + 1 + close + 1..].trim_start();
    }

    if out.is_finite() {
        out
    } else {
        Matrix::IDENTITY
    }
}

pub(crate) fn parse_number_list(input: &str) -> Vec<f32> {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<f32>().ok())
        .collect()
}
