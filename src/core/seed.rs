//! Built-in datasets: the first-run account collection and the weekly stats template

use crate::core::models::{AccountRecord, ChannelStats};

struct SeedAccount {
    id: &'static str,
    avatar: &'static str,
    created_at: &'static str,
    subscribers: u64,
    total_views: u64,
    total_videos: u64,
    estimated_revenue: f64,
    is_active: bool,
}

const SEED_ACCOUNTS: [SeedAccount; 5] = [
    SeedAccount {
        id: "1",
        avatar: "/avatars/tech.png",
        created_at: "2022-05-15",
        subscribers: 12_500,
        total_views: 450_000,
        total_videos: 87,
        estimated_revenue: 1250.0,
        is_active: true,
    },
    SeedAccount {
        id: "2",
        avatar: "/avatars/gaming.png",
        created_at: "2021-08-22",
        subscribers: 34_500,
        total_views: 1_280_000,
        total_videos: 156,
        estimated_revenue: 3560.0,
        is_active: true,
    },
    SeedAccount {
        id: "3",
        avatar: "/avatars/cooking.png",
        created_at: "2022-01-10",
        subscribers: 7_800,
        total_views: 210_000,
        total_videos: 45,
        estimated_revenue: 680.0,
        is_active: true,
    },
    SeedAccount {
        id: "4",
        avatar: "/avatars/travel.png",
        created_at: "2021-11-05",
        subscribers: 21_300,
        total_views: 570_000,
        total_videos: 68,
        estimated_revenue: 1890.0,
        is_active: true,
    },
    SeedAccount {
        id: "5",
        avatar: "/avatars/education.png",
        created_at: "2020-03-28",
        subscribers: 56_700,
        total_views: 1_560_000,
        total_videos: 210,
        estimated_revenue: 4530.0,
        is_active: false,
    },
];

/// Collection written on first access when nothing has been persisted yet
pub fn default_accounts() -> Vec<AccountRecord> {
    SEED_ACCOUNTS
        .iter()
        .map(|seed| AccountRecord {
            id: seed.id.to_string(),
            name: format!("Automated Channel {}", seed.id),
            email: format!("channel{}@yourdomain.com", seed.id),
            profile_image: seed.avatar.to_string(),
            created_at: seed.created_at.to_string(),
            subscribers: seed.subscribers,
            total_views: seed.total_views,
            total_videos: seed.total_videos,
            estimated_revenue: seed.estimated_revenue,
            is_active: seed.is_active,
            channel_id: None,
            description: None,
            content_niche: None,
            upload_frequency: None,
        })
        .collect()
}

/// Static last-week template, scaled per account for display
pub fn last_week_stats() -> Vec<ChannelStats> {
    [
        ("Monday", 150, 2500, 12.0),
        ("Tuesday", 180, 2800, 14.5),
        ("Wednesday", 220, 3200, 18.0),
        ("Thursday", 190, 3000, 16.0),
        ("Friday", 250, 3800, 22.0),
        ("Saturday", 310, 4500, 31.0),
        ("Sunday", 280, 4200, 28.0),
    ]
    .into_iter()
    .map(|(day, subscribers, views, revenue)| ChannelStats {
        day: day.to_string(),
        subscribers,
        views,
        revenue,
    })
    .collect()
}
