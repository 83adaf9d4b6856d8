use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    ConsistencyWarningEvent,
    ContributorPaidEvent,
    EventHandler,
    EventProducer,
    Handler,
    OrderConfirmedEvent,
};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub contributor_paid_producer: Vec<EventProducer<ContributorPaidEvent>>,
    pub order_confirmed_producer: Vec<EventProducer<OrderConfirmedEvent>>,
    pub consistency_warning_producer: Vec<EventProducer<ConsistencyWarningEvent>>,
}

pub struct EventHandlers {
    pub on_contributor_paid: Option<EventHandler<ContributorPaidEvent>>,
    pub on_order_confirmed: Option<EventHandler<OrderConfirmedEvent>>,
    pub on_consistency_warning: Option<EventHandler<ConsistencyWarningEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_contributor_paid = hooks.on_contributor_paid.map(|f| EventHandler::new(buffer_size, f));
        let on_order_confirmed = hooks.on_order_confirmed.map(|f| EventHandler::new(buffer_size, f));
        let on_consistency_warning = hooks.on_consistency_warning.map(|f| EventHandler::new(buffer_size, f));
        Self { on_contributor_paid, on_order_confirmed, on_consistency_warning }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_contributor_paid {
            result.contributor_paid_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_confirmed {
            result.order_confirmed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_consistency_warning {
            result.consistency_warning_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_contributor_paid {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_order_confirmed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_consistency_warning {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_contributor_paid: Option<Handler<ContributorPaidEvent>>,
    pub on_order_confirmed: Option<Handler<OrderConfirmedEvent>>,
    pub on_consistency_warning: Option<Handler<ConsistencyWarningEvent>>,
}

impl EventHooks {
    pub fn on_contributor_paid<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(ContributorPaidEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_contributor_paid = Some(Arc::new(f));
        self
    }

    pub fn on_order_confirmed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderConfirmedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_confirmed = Some(Arc::new(f));
        self
    }

    pub fn on_consistency_warning<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(ConsistencyWarningEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_consistency_warning = Some(Arc::new(f));
        self
    }
}
