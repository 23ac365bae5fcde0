use optflow_image::VectorField;
use serde::{Deserialize, Serialize};

/// Boundary conditions of the smoothness term.
///
/// The iterative solvers only update interior pixels. The boundary conditions
/// decide what happens to the one pixel wide border after every sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryConditions {
    /// The border keeps its values, which stay at the seed of the solve.
    Dirichlet,
    /// The border copies the adjacent interior vector (zero normal derivative).
    #[default]
    Neumann,
}

impl BoundaryConditions {
    /// Repair the border of a vector field after an interior sweep.
    ///
    /// Under Neumann conditions the top and bottom rows copy the row next to them,
    /// the left and right columns copy the column next to them, and every corner
    /// copies its diagonal interior neighbour. Only the displacement channels are
    /// touched. Fields narrower or lower than three pixels have no interior and are
    /// left unchanged.
    ///
    /// # Example
    ///
    /// ```
    /// use optflow_image::VectorField;
    /// use optflow_motion::BoundaryConditions;
    ///
    /// let mut field = VectorField::new([3, 3].into(), 0);
    /// field.set_vector(1, 1, [1.0, -1.0]);
    ///
    /// BoundaryConditions::Neumann.apply(&mut field);
    ///
    /// assert_eq!(field.vector(0, 0), [1.0, -1.0]);
    /// assert_eq!(field.vector(2, 1), [1.0, -1.0]);
    /// ```
    pub fn apply(self, field: &mut VectorField) {
        if self == BoundaryConditions::Dirichlet {
            return;
        }

        let (w, h) = (field.width(), field.height());
        if w < 3 || h < 3 {
            return;
        }

        // top and bottom edges
        for x in 1..w - 1 {
            let top = field.vector(x, 1);
            field.set_vector(x, 0, top);
            let bottom = field.vector(x, h - 2);
            field.set_vector(x, h - 1, bottom);
        }

        // left and right edges
        for y in 1..h - 1 {
            let left = field.vector(1, y);
            field.set_vector(0, y, left);
            let right = field.vector(w - 2, y);
            field.set_vector(w - 1, y, right);
        }

        // corners
        let corners = [
            ((0, 0), (1, 1)),
            ((w - 1, 0), (w - 2, 1)),
            ((0, h - 1), (1, h - 2)),
            ((w - 1, h - 1), (w - 2, h - 2)),
        ];
        for ((x, y), (xs, ys)) in corners {
            let v = field.vector(xs, ys);
            field.set_vector(x, y, v);
        }
    }
}

impl std::fmt::Display for BoundaryConditions {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            BoundaryConditions::Dirichlet => write!(f, "Dirichlet"),
            BoundaryConditions::Neumann => write!(f, "Neumann"),
        }
    }
}
