use crate::models::appraisal::{AppraisalGrade, GradeResult};

/// Lower bounds of each tier, checked top-down; anything below the last is a C.
const GRADE_THRESHOLDS: [(f64, AppraisalGrade); 4] = [
    (81.0, AppraisalGrade::APlus),
    (61.0, AppraisalGrade::A),
    (41.0, AppraisalGrade::B),
    (21.0, AppraisalGrade::BMinus),
];

/// Map an appraisal percentage to its grade and label.
///
/// Callers do not clamp the input, so negative values, values above 100 and
/// NaN are all accepted and fall through to a tier.
pub fn grade(percentage: f64) -> GradeResult {
    let grade = GRADE_THRESHOLDS
        .iter()
        .find(|(threshold, _)| percentage >= *threshold)
        .map(|(_, grade)| *grade)
        .unwrap_or(AppraisalGrade::C);

    GradeResult {
        grade,
        label: grade.label(),
    }
}
