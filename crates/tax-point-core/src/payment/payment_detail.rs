use serde::{Deserialize, Serialize};

use crate::geo::TaxPointsProperties;
use crate::payment::subjects::{OptionalService, SubjectDetail, TaxableYqYr, TaxableYqYrs};
use crate::types::{GeoId, RuleId, TicketedPointTag};

/// Addresses one subject of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubjectRef {
    Itinerary,
    OptionalService(usize),
    YqYr(usize),
}

/// Everything one (itinerary, tax rule) evaluation resolves and fails.
///
/// Owned by a single evaluation; rule applicators mutate it in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentDetail {
    pub ticketed_point_tag: TicketedPointTag,
    pub itinerary: SubjectDetail,
    pub properties: TaxPointsProperties,
    #[serde(default)]
    pub optional_services: Vec<OptionalService>,
    #[serde(default)]
    pub yq_yrs: TaxableYqYrs,
}

impl PaymentDetail {
    pub fn new(
        begin: GeoId,
        end: GeoId,
        ticketed_point_tag: TicketedPointTag,
        properties: TaxPointsProperties,
    ) -> Self {
        Self {
            ticketed_point_tag,
            itinerary: SubjectDetail::new(begin, Some(end)),
            properties,
            optional_services: Vec::new(),
            yq_yrs: TaxableYqYrs::default(),
        }
    }

    pub fn with_optional_service(mut self, service: OptionalService) -> Self {
        self.optional_services.push(service);
        self
    }

    pub fn with_yq_yr(mut self, item: TaxableYqYr, begin: GeoId, end: GeoId) -> Self {
        self.yq_yrs.push(item, begin, end);
        self
    }

    pub fn detail(&self, subject: SubjectRef) -> Option<&SubjectDetail> {
        match subject {
            SubjectRef::Itinerary => Some(&self.itinerary),
            SubjectRef::OptionalService(i) => self.optional_services.get(i).map(|s| &s.detail),
            SubjectRef::YqYr(i) => self.yq_yrs.details.get(i),
        }
    }

    pub fn detail_mut(&mut self, subject: SubjectRef) -> Option<&mut SubjectDetail> {
        match subject {
            SubjectRef::Itinerary => Some(&mut self.itinerary),
            SubjectRef::OptionalService(i) => {
                self.optional_services.get_mut(i).map(|s| &mut s.detail)
            }
            SubjectRef::YqYr(i) => self.yq_yrs.details.get_mut(i),
        }
    }

    /// Every subject that no earlier rule has failed.
    pub fn live_subjects(&self) -> Vec<SubjectRef> {
        let services = (0..self.optional_services.len()).map(SubjectRef::OptionalService);
        let yq_yrs = (0..self.yq_yrs.len()).map(SubjectRef::YqYr);
        std::iter::once(SubjectRef::Itinerary)
            .chain(services)
            .chain(yq_yrs)
            .filter(|s| self.detail(*s).is_some_and(|d| !d.is_failed()))
            .collect()
    }

    /// Live subjects that carry their own segment tax points: the itinerary,
    /// segment-related optional services and YQ/YR charges.
    pub fn live_segment_subjects(&self) -> Vec<SubjectRef> {
        self.live_subjects()
            .into_iter()
            .filter(|s| match s {
                SubjectRef::OptionalService(i) => {
                    self.optional_services[*i].service_type.is_segment_related()
                }
                _ => true,
            })
            .collect()
    }

    /// Fails `subject` with `rule` unless an earlier rule already did.
    pub fn fail_subject(&mut self, subject: SubjectRef, rule: RuleId) {
        if let Some(detail) = self.detail_mut(subject) {
            if detail.fail(rule) {
                tracing::debug!(?subject, ?rule, "subject failed tax point rule");
            }
        }
    }

    pub fn ticketed_only(&self) -> bool {
        self.ticketed_point_tag.ticketed_only()
    }

    pub fn are_all_optional_services_failed(&self) -> bool {
        self.optional_services.iter().all(OptionalService::is_failed)
    }

    /// True once no subject is left to tax.
    pub fn is_failed_completely(&self) -> bool {
        self.itinerary.is_failed()
            && self.are_all_optional_services_failed()
            && self.yq_yrs.are_all_failed()
    }

    /// Subjects failed so far, itinerary included.
    pub fn failed_subject_count(&self) -> usize {
        usize::from(self.itinerary.is_failed())
            + self.optional_services.iter().filter(|s| s.is_failed()).count()
            + self.yq_yrs.details.iter().filter(|d| d.is_failed()).count()
    }

    pub fn subject_count(&self) -> usize {
        1 + self.optional_services.len() + self.yq_yrs.len()
    }
}
